#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for pack/unpack round trips and tamper detection.

use proptest::prelude::*;
use totem_tag_core::layout::{
    DATA_HMAC_END, DATA_HMAC_OFFSET, TAG_HMAC_END, TAG_HMAC_OFFSET,
};
use totem_tag_core::{
    pack, to_wire, unpack, MasterKeySet, INTERNAL_SIZE, KEY_FILE_LEN, TAG_FILE_SIZE,
};

/// Fixed key set for single-variable properties.
fn prop_keyset() -> MasterKeySet {
    let mut raw = [0u8; KEY_FILE_LEN];
    raw[..14].copy_from_slice(b"totem-data-pp\0");
    raw[0x0F] = 11;
    for (i, b) in raw[0x10..0x40].iter_mut().enumerate() {
        *b = (i * 13 % 251) as u8;
    }
    raw[0x40..0x4E].copy_from_slice(b"totem-tag-pp\0\0");
    raw[0x40 + 0x0F] = 16;
    for (i, b) in raw[0x50..].iter_mut().enumerate() {
        *b = (i * 29 % 241) as u8;
    }
    MasterKeySet::from_bytes(&raw).expect("key set should parse")
}

/// Key-file bytes with both magic-byte counts clamped into range.
fn keyfile_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), KEY_FILE_LEN).prop_map(|mut raw| {
        raw[0x0F] &= 0x0F;
        raw[0x40 + 0x0F] &= 0x0F;
        raw
    })
}

fn plain_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), INTERNAL_SIZE)
}

/// The plaintext a round trip reproduces: the input with both signature
/// slots replaced by the values pack computed.
fn expected_plain(keys: &MasterKeySet, plain: &[u8; INTERNAL_SIZE]) -> [u8; INTERNAL_SIZE] {
    let cipher_buf = pack(keys, plain);
    let mut expected = *plain;
    expected[DATA_HMAC_OFFSET..DATA_HMAC_END]
        .copy_from_slice(&cipher_buf[DATA_HMAC_OFFSET..DATA_HMAC_END]);
    expected[TAG_HMAC_OFFSET..TAG_HMAC_END]
        .copy_from_slice(&cipher_buf[TAG_HMAC_OFFSET..TAG_HMAC_END]);
    expected
}

fn packed_wire(keys: &MasterKeySet, plain: &[u8; INTERNAL_SIZE]) -> [u8; TAG_FILE_SIZE] {
    let cipher_buf = pack(keys, plain);
    let mut wire = [0u8; TAG_FILE_SIZE];
    to_wire(&cipher_buf, &mut wire).expect("to_wire should succeed");
    wire
}

/// Wire offsets covered by at least one signature input (directly, or via
/// the keygen seed, or via the encrypted payload).
fn authenticated_wire_index() -> impl Strategy<Value = usize> {
    prop_oneof![
        0x000usize..0x008, // serial: keygen seed input
        0x011usize..0x208, // settings tail, signatures, identity, app data
    ]
}

/// Wire offsets outside every signature input: the lock/capability header,
/// the first settings byte, and the unmapped trailer.
fn unauthenticated_wire_index() -> impl Strategy<Value = usize> {
    prop_oneof![0x008usize..0x011, 0x208usize..TAG_FILE_SIZE]
}

proptest! {
    /// pack → to_wire → unpack recovers the signed plaintext and verifies.
    #[test]
    fn round_trip_verifies(plain in plain_strategy()) {
        let keys = prop_keyset();
        let plain: [u8; INTERNAL_SIZE] = plain.try_into().unwrap();

        let wire = packed_wire(&keys, &plain);
        let outcome = unpack(&keys, &wire).expect("unpack should succeed");

        prop_assert!(outcome.verified);
        prop_assert_eq!(outcome.plain, expected_plain(&keys, &plain));
    }

    /// Round trip holds for arbitrary key sets too.
    #[test]
    fn round_trip_verifies_for_arbitrary_keys(
        keyfile in keyfile_strategy(),
        plain in plain_strategy(),
    ) {
        let keys = MasterKeySet::from_bytes(&keyfile).expect("clamped key file should parse");
        let plain: [u8; INTERNAL_SIZE] = plain.try_into().unwrap();

        let wire = packed_wire(&keys, &plain);
        let outcome = unpack(&keys, &wire).expect("unpack should succeed");
        prop_assert!(outcome.verified);
    }

    /// Any single-bit flip in an authenticated wire byte breaks verification.
    #[test]
    fn authenticated_bit_flip_fails(
        plain in plain_strategy(),
        index in authenticated_wire_index(),
        bit in 0u32..8,
    ) {
        let keys = prop_keyset();
        let plain: [u8; INTERNAL_SIZE] = plain.try_into().unwrap();

        let mut wire = packed_wire(&keys, &plain);
        wire[index] ^= 1u8 << bit;

        let outcome = unpack(&keys, &wire).expect("unpack should succeed");
        prop_assert!(!outcome.verified, "flip at wire {index:#05x} bit {bit} must fail");
    }

    /// Flips outside every signature input leave the verdict untouched.
    #[test]
    fn unauthenticated_bit_flip_keeps_verdict(
        plain in plain_strategy(),
        index in unauthenticated_wire_index(),
        bit in 0u32..8,
    ) {
        let keys = prop_keyset();
        let plain: [u8; INTERNAL_SIZE] = plain.try_into().unwrap();

        let mut wire = packed_wire(&keys, &plain);
        wire[index] ^= 1u8 << bit;

        let outcome = unpack(&keys, &wire).expect("unpack should succeed");
        prop_assert!(outcome.verified, "flip at wire {index:#05x} bit {bit} must not fail");
    }
}
