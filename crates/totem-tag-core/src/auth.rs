//! Pack/unpack orchestration: derivation, payload cipher, chained HMAC pair.
//!
//! This module provides:
//! - [`unpack`]: wire dump → verified plaintext canonical buffer
//! - [`pack`]: plaintext canonical buffer → encrypted canonical buffer
//! - [`UnpackedTag`]: plaintext plus the verification verdict
//!
//! # Signature chaining
//!
//! Two HMAC-SHA256 signatures protect a tag, and their computation order is
//! a hard invariant of the scheme, not a convention:
//!
//! 1. The **identity** signature (hardware-identity keys) covers the serial,
//!    model info, and keygen salt.
//! 2. The **user-data** signature (user-data keys) covers the settings tail,
//!    app data, *the identity signature itself*, and the identity fields.
//!
//! Because step 2's input contains step 1's output, the identity signature
//! must be committed to its slot before the user-data signature is computed.
//! Reversing the order yields a different (and wrong) user-data signature
//! over the same plaintext and keys.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::cipher::crypt_payload;
use crate::error::TagError;
use crate::keyfile::MasterKeySet;
use crate::keygen::{generate_keys, DerivedKeys};
use crate::layout::{
    to_internal, DATA_HMAC_END, DATA_HMAC_OFFSET, HMAC_LEN, IDENT_OFFSET, INTERNAL_SIZE,
    SIGNED_OFFSET, TAG_HMAC_END, TAG_HMAC_OFFSET,
};
use crate::seed::calc_seed;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Result of [`unpack`]: the plaintext canonical buffer and whether both
/// signatures matched.
///
/// The plaintext is fully populated even when `verified` is false, so
/// callers can apply heuristics ("looks already decrypted") or force-accept.
#[must_use = "an unverified tag must not be silently trusted"]
#[derive(Clone, Debug)]
pub struct UnpackedTag {
    /// Decrypted canonical buffer.
    pub plain: [u8; INTERNAL_SIZE],
    /// True if both recomputed signatures matched the dump's.
    pub verified: bool,
}

// ---------------------------------------------------------------------------
// Signature helpers
// ---------------------------------------------------------------------------

/// HMAC-SHA256 keyed with a derived HMAC key. 16-byte keys are always
/// accepted, hence the infallible construction.
fn mac_for(keys: &DerivedKeys) -> HmacSha256 {
    HmacSha256::new_from_slice(keys.hmac_key()).expect("HMAC-SHA256 accepts any key length")
}

/// Identity signature: HMAC over the serial/model/salt tail.
fn ident_signature(keys: &DerivedKeys, buf: &[u8; INTERNAL_SIZE]) -> [u8; HMAC_LEN] {
    let mut mac = mac_for(keys);
    mac.update(&buf[IDENT_OFFSET..INTERNAL_SIZE]);
    mac.finalize().into_bytes().into()
}

// ---------------------------------------------------------------------------
// Unpack
// ---------------------------------------------------------------------------

/// Convert a wire dump into its verified plaintext canonical form.
///
/// The seed fields are never encrypted, so key derivation runs directly on
/// the reordered ciphertext. Both signatures are then recomputed over the
/// decrypted bytes, identity first and user-data second (see the module
/// documentation for why that order is mandatory), then compared against
/// the slots of the original ciphertext.
///
/// Verification failure is **not** an error: the returned
/// [`UnpackedTag::verified`] flag carries the verdict and the plaintext is
/// fully populated either way.
///
/// # Errors
///
/// Returns [`TagError::BufferTooSmall`] if `wire` is shorter than
/// [`INTERNAL_SIZE`].
pub fn unpack(keys: &MasterKeySet, wire: &[u8]) -> Result<UnpackedTag, TagError> {
    let cipher_buf = to_internal(wire)?;
    let seed = calc_seed(&cipher_buf);
    let data_keys = generate_keys(keys.data(), &seed);
    let tag_keys = generate_keys(keys.tag(), &seed);

    let mut plain = [0u8; INTERNAL_SIZE];
    crypt_payload(&data_keys, &cipher_buf, &mut plain);

    let ident_mac = ident_signature(&tag_keys, &plain);
    plain[TAG_HMAC_OFFSET..TAG_HMAC_END].copy_from_slice(&ident_mac);

    // Only now is the user-data input range complete.
    let mut mac = mac_for(&data_keys);
    mac.update(&plain[SIGNED_OFFSET..INTERNAL_SIZE]);
    let data_mac: [u8; HMAC_LEN] = mac.finalize().into_bytes().into();
    plain[DATA_HMAC_OFFSET..DATA_HMAC_END].copy_from_slice(&data_mac);

    let ident_ok = ident_mac.ct_eq(&cipher_buf[TAG_HMAC_OFFSET..TAG_HMAC_END]);
    let data_ok = data_mac.ct_eq(&cipher_buf[DATA_HMAC_OFFSET..DATA_HMAC_END]);
    let verified = bool::from(ident_ok & data_ok);

    Ok(UnpackedTag { plain, verified })
}

// ---------------------------------------------------------------------------
// Pack
// ---------------------------------------------------------------------------

/// Convert a plaintext canonical buffer into its encrypted canonical form.
///
/// The fixed-size input type is the precondition: callers validate sizes at
/// their own boundary. The identity signature is computed and committed
/// before the user-data signature, whose input splices the fresh identity
/// signature between the plaintext ranges it covers.
///
/// The result still uses the canonical field order; apply
/// [`crate::layout::to_wire`] to produce a hardware dump.
#[must_use]
pub fn pack(keys: &MasterKeySet, plain: &[u8; INTERNAL_SIZE]) -> [u8; INTERNAL_SIZE] {
    let seed = calc_seed(plain);
    let tag_keys = generate_keys(keys.tag(), &seed);
    let data_keys = generate_keys(keys.data(), &seed);

    let mut cipher_buf = [0u8; INTERNAL_SIZE];

    let ident_mac = ident_signature(&tag_keys, plain);
    cipher_buf[TAG_HMAC_OFFSET..TAG_HMAC_END].copy_from_slice(&ident_mac);

    // User-data signature over: settings tail + app data, then the identity
    // signature just written, then the identity fields. Byte-for-byte the
    // same sequence unpack hashes after decryption.
    let mut mac = mac_for(&data_keys);
    mac.update(&plain[SIGNED_OFFSET..TAG_HMAC_OFFSET]);
    mac.update(&cipher_buf[TAG_HMAC_OFFSET..TAG_HMAC_END]);
    mac.update(&plain[IDENT_OFFSET..INTERNAL_SIZE]);
    let data_mac: [u8; HMAC_LEN] = mac.finalize().into_bytes().into();
    cipher_buf[DATA_HMAC_OFFSET..DATA_HMAC_END].copy_from_slice(&data_mac);

    crypt_payload(&data_keys, plain, &mut cipher_buf);
    cipher_buf
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
