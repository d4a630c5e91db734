//! Deterministic per-tag key derivation.
//!
//! This module provides:
//! - [`DerivedKeys`]: the ephemeral {AES key, AES IV, HMAC key} triple
//! - [`generate_keys`]: derive a [`DerivedKeys`] from (record, seed)
//!
//! # Construction
//!
//! The derivation input is `type_string ‖ magic[..magic_size] ‖ seed`. Its
//! SHA-256 digest seeds the counter block of an AES-256-CTR keystream keyed
//! by the record's xor pad; the first 48 keystream bytes are split into the
//! three 16-byte derived keys.
//!
//! Determinism is load-bearing: packing derives keys from the plaintext
//! buffer while unpacking derives them from the still-encrypted one (the
//! seed fields are never encrypted), and both must agree byte for byte.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes256;
use ctr::Ctr128BE;
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::keyfile::{MasterKeyRecord, MAGIC_CAPACITY, TYPE_STRING_LEN};
use crate::seed::{KeygenSeed, KEYGEN_SEED_LEN};

/// Length of each derived key in bytes.
pub const DERIVED_KEY_LEN: usize = 16;

/// Keystream bytes consumed per derivation: three 16-byte keys.
const DRBG_OUTPUT_LEN: usize = 48;

/// Upper bound on the derivation input length.
const DRBG_INPUT_CAPACITY: usize = TYPE_STRING_LEN + MAGIC_CAPACITY + KEYGEN_SEED_LEN;

/// AES-256 in counter mode with a big-endian 128-bit counter block.
type DrbgCipher = Ctr128BE<Aes256>;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-call derived key triple.
///
/// Lifetime is bounded to one pack or unpack invocation; never cached across
/// calls. Zeroized on drop, masked in `Debug` output.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    aes_key: [u8; DERIVED_KEY_LEN],
    aes_iv: [u8; DERIVED_KEY_LEN],
    hmac_key: [u8; DERIVED_KEY_LEN],
}

impl DerivedKeys {
    /// AES-128 key for the payload cipher.
    #[must_use]
    pub const fn aes_key(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.aes_key
    }

    /// Initial counter block for the payload cipher.
    #[must_use]
    pub const fn aes_iv(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.aes_iv
    }

    /// HMAC-SHA256 key for this record's signature.
    #[must_use]
    pub const fn hmac_key(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.hmac_key
    }
}

impl fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKeys(***)")
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive the per-tag key triple for one master key record and one seed.
///
/// Deterministic: identical `(record, seed)` inputs always produce a
/// byte-identical [`DerivedKeys`].
#[must_use]
pub fn generate_keys(record: &MasterKeyRecord, seed: &KeygenSeed) -> DerivedKeys {
    let mut input = Vec::with_capacity(DRBG_INPUT_CAPACITY);
    input.extend_from_slice(record.type_string());
    input.extend_from_slice(record.magic());
    input.extend_from_slice(seed);

    let digest = Sha256::digest(&input);
    let mut counter = [0u8; DERIVED_KEY_LEN];
    counter.copy_from_slice(&digest[..DERIVED_KEY_LEN]);

    let mut stream = [0u8; DRBG_OUTPUT_LEN];
    let mut drbg = DrbgCipher::new(record.xor_pad().into(), &counter.into());
    drbg.apply_keystream(&mut stream);

    let mut aes_key = [0u8; DERIVED_KEY_LEN];
    let mut aes_iv = [0u8; DERIVED_KEY_LEN];
    let mut hmac_key = [0u8; DERIVED_KEY_LEN];
    aes_key.copy_from_slice(&stream[..16]);
    aes_iv.copy_from_slice(&stream[16..32]);
    hmac_key.copy_from_slice(&stream[32..48]);

    input.zeroize();
    stream.zeroize();
    counter.zeroize();

    DerivedKeys {
        aes_key,
        aes_iv,
        hmac_key,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
