//! Per-tag keygen seed extraction.
//!
//! The seed feeds key derivation on both sides of the scheme. Every field it
//! pulls from lies **outside** the encrypted payload range, so packing (which
//! reads a plaintext buffer) and unpacking (which reads the still-encrypted
//! buffer) extract byte-identical seeds, the property the whole scheme
//! leans on.

use crate::layout::{
    FORMAT_ID_END, FORMAT_ID_OFFSET, INTERNAL_SIZE, KEYGEN_SALT_OFFSET, SERIAL_END, SERIAL_OFFSET,
};

/// Length of the keygen seed in bytes.
pub const KEYGEN_SEED_LEN: usize = 50;

/// The per-tag keygen seed.
pub type KeygenSeed = [u8; KEYGEN_SEED_LEN];

// Seed-relative destination offsets. The serial number appears twice, in two
// adjacent slots; the duplication is part of the fixed scheme and must not
// be "simplified" away.
const FORMAT_ID_SLOT: usize = 0x00;
const SERIAL_SLOT_A: usize = 0x02;
const SERIAL_SLOT_B: usize = 0x0A;
const SALT_SLOT: usize = 0x12;

/// Extract the keygen seed from a canonical-layout buffer.
///
/// Pure and total: works on any internal-shaped input, encrypted or not.
/// Layout: format id (2 B) ‖ serial (8 B) ‖ serial again (8 B) ‖
/// keygen salt (32 B).
#[must_use]
pub fn calc_seed(internal: &[u8; INTERNAL_SIZE]) -> KeygenSeed {
    let mut seed = [0u8; KEYGEN_SEED_LEN];
    seed[FORMAT_ID_SLOT..SERIAL_SLOT_A]
        .copy_from_slice(&internal[FORMAT_ID_OFFSET..FORMAT_ID_END]);
    seed[SERIAL_SLOT_A..SERIAL_SLOT_B].copy_from_slice(&internal[SERIAL_OFFSET..SERIAL_END]);
    seed[SERIAL_SLOT_B..SALT_SLOT].copy_from_slice(&internal[SERIAL_OFFSET..SERIAL_END]);
    seed[SALT_SLOT..].copy_from_slice(&internal[KEYGEN_SALT_OFFSET..INTERNAL_SIZE]);
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_fields_come_from_documented_offsets() {
        let mut internal = [0u8; INTERNAL_SIZE];
        internal[FORMAT_ID_OFFSET] = 0x11;
        internal[FORMAT_ID_OFFSET + 1] = 0x22;
        internal[SERIAL_OFFSET..SERIAL_END].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        for (i, b) in internal[KEYGEN_SALT_OFFSET..].iter_mut().enumerate() {
            *b = 0x80 + i as u8;
        }

        let seed = calc_seed(&internal);
        assert_eq!(&seed[..2], &[0x11, 0x22]);
        assert_eq!(&seed[2..10], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&seed[18..20], &[0x80, 0x81]);
        assert_eq!(seed[49], 0x80 + 31);
    }

    #[test]
    fn serial_is_duplicated_into_adjacent_slots() {
        let mut internal = [0u8; INTERNAL_SIZE];
        internal[SERIAL_OFFSET..SERIAL_END].copy_from_slice(&[9, 8, 7, 6, 5, 4, 3, 2]);
        let seed = calc_seed(&internal);
        assert_eq!(&seed[2..10], &seed[10..18]);
    }

    #[test]
    fn seed_ignores_payload_bytes() {
        let zeroed = calc_seed(&[0u8; INTERNAL_SIZE]);

        let mut internal = [0u8; INTERNAL_SIZE];
        for b in &mut internal[crate::layout::PAYLOAD_OFFSET..crate::layout::PAYLOAD_END] {
            *b = 0xFF;
        }
        assert_eq!(
            calc_seed(&internal),
            zeroed,
            "payload bytes must not influence the seed"
        );
    }
}
