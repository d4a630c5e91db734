//! Payload stream cipher.
//!
//! AES-128-CTR keystream XOR over the encrypted payload range of a canonical
//! buffer. Encryption and decryption are the same operation under matching
//! derived keys, so there is exactly one routine.
//!
//! Responsibility split: this stage transforms the payload range and copies
//! the plaintext pass-through regions (header, settings head, identity
//! tail). The two HMAC slots are **not** written here; the authenticator
//! owns them.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes128;
use ctr::Ctr128BE;

use crate::keygen::DerivedKeys;
use crate::layout::{
    HEADER_END, HEADER_OFFSET, IDENT_OFFSET, INTERNAL_SIZE, PAYLOAD_END, PAYLOAD_OFFSET,
    SETTINGS_OFFSET,
};

/// AES-128 in counter mode with a big-endian 128-bit counter block.
type PayloadCipher = Ctr128BE<Aes128>;

/// Transform `input` into `output`: XOR the payload range with the keystream
/// from the user-data keys, copy the pass-through regions, leave the HMAC
/// slots alone.
///
/// Call with ciphertext to decrypt, with plaintext to encrypt; the
/// keystream XOR is its own inverse.
pub fn crypt_payload(
    keys: &DerivedKeys,
    input: &[u8; INTERNAL_SIZE],
    output: &mut [u8; INTERNAL_SIZE],
) {
    // Pass-through: lock header, settings head (through the end of the
    // format id), identity tail. All outside the encrypted range.
    output[HEADER_OFFSET..HEADER_END].copy_from_slice(&input[HEADER_OFFSET..HEADER_END]);
    output[SETTINGS_OFFSET..PAYLOAD_OFFSET]
        .copy_from_slice(&input[SETTINGS_OFFSET..PAYLOAD_OFFSET]);
    output[IDENT_OFFSET..INTERNAL_SIZE].copy_from_slice(&input[IDENT_OFFSET..INTERNAL_SIZE]);

    output[PAYLOAD_OFFSET..PAYLOAD_END].copy_from_slice(&input[PAYLOAD_OFFSET..PAYLOAD_END]);
    let mut cipher = PayloadCipher::new(keys.aes_key().into(), keys.aes_iv().into());
    cipher.apply_keystream(&mut output[PAYLOAD_OFFSET..PAYLOAD_END]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyfile::{MasterKeyRecord, KEY_RECORD_LEN};
    use crate::keygen::generate_keys;
    use crate::layout::{DATA_HMAC_END, DATA_HMAC_OFFSET, TAG_HMAC_END, TAG_HMAC_OFFSET};
    use crate::seed::KEYGEN_SEED_LEN;

    fn test_keys() -> DerivedKeys {
        let mut raw = [0x42u8; KEY_RECORD_LEN];
        raw[0x0F] = 8;
        let record = MasterKeyRecord::from_bytes(&raw).expect("record should parse");
        generate_keys(&record, &[0x21u8; KEYGEN_SEED_LEN])
    }

    #[test]
    fn crypt_twice_is_identity_on_payload() {
        let keys = test_keys();
        let mut plain = [0u8; INTERNAL_SIZE];
        for (i, b) in plain.iter_mut().enumerate() {
            *b = (i % 256) as u8;
        }

        let mut once = [0u8; INTERNAL_SIZE];
        crypt_payload(&keys, &plain, &mut once);
        let mut twice = [0u8; INTERNAL_SIZE];
        crypt_payload(&keys, &once, &mut twice);

        assert_eq!(
            &twice[PAYLOAD_OFFSET..PAYLOAD_END],
            &plain[PAYLOAD_OFFSET..PAYLOAD_END]
        );
    }

    #[test]
    fn payload_actually_changes() {
        let keys = test_keys();
        let plain = [0x13u8; INTERNAL_SIZE];
        let mut out = [0u8; INTERNAL_SIZE];
        crypt_payload(&keys, &plain, &mut out);
        assert_ne!(&out[PAYLOAD_OFFSET..PAYLOAD_END], &plain[PAYLOAD_OFFSET..PAYLOAD_END]);
    }

    #[test]
    fn pass_through_regions_are_copied_verbatim() {
        let keys = test_keys();
        let mut plain = [0u8; INTERNAL_SIZE];
        plain[..SETTINGS_OFFSET].fill(0x99);
        plain[SETTINGS_OFFSET..PAYLOAD_OFFSET].fill(0x88);
        plain[IDENT_OFFSET..].fill(0x77);

        let mut out = [0u8; INTERNAL_SIZE];
        crypt_payload(&keys, &plain, &mut out);
        assert_eq!(&out[HEADER_OFFSET..HEADER_END], &[0x99; 8]);
        assert_eq!(&out[SETTINGS_OFFSET..PAYLOAD_OFFSET], &[0x88; 4]);
        assert!(out[IDENT_OFFSET..].iter().all(|&b| b == 0x77));
    }

    #[test]
    fn hmac_slots_are_left_alone() {
        let keys = test_keys();
        let plain = [0xFFu8; INTERNAL_SIZE];
        let mut out = [0u8; INTERNAL_SIZE];
        crypt_payload(&keys, &plain, &mut out);
        assert!(
            out[DATA_HMAC_OFFSET..DATA_HMAC_END].iter().all(|&b| b == 0),
            "user-data HMAC slot belongs to the authenticator"
        );
        assert!(
            out[TAG_HMAC_OFFSET..TAG_HMAC_END].iter().all(|&b| b == 0),
            "identity HMAC slot belongs to the authenticator"
        );
    }
}
