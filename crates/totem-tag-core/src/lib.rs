//! `totem-tag-core`: fixed tag-dump cryptography for TOTEM.
//!
//! This crate is the audit target: zero I/O beyond reading the key file,
//! zero async, zero logging. It implements exactly one vendor scheme tied to
//! one tag geometry. No algorithm agility, no key rotation, no other buffer
//! sizes.
//!
//! # Pipeline
//!
//! ```text
//! unpack:  wire dump ─ to_internal ─ calc_seed ─ generate_keys ×2
//!                      ─ crypt_payload (decrypt) ─ chained HMAC verify
//! pack:    plaintext ─ calc_seed ─ generate_keys ×2
//!                      ─ chained HMAC sign ─ crypt_payload (encrypt) ─ to_wire
//! ```
//!
//! Pack and unpack are pure functions of their input buffer and the loaded
//! [`MasterKeySet`]; the key set is immutable after load and safe to share
//! across threads.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;

pub mod auth;
pub mod cipher;
pub mod keyfile;
pub mod keygen;
pub mod layout;
pub mod seed;

pub use auth::{pack, unpack, UnpackedTag};
pub use error::TagError;
pub use keyfile::{
    load_keys, MasterKeyRecord, MasterKeySet, KEY_FILE_LEN, KEY_RECORD_LEN, MAGIC_CAPACITY,
    TYPE_STRING_LEN, XOR_PAD_LEN,
};
pub use keygen::{generate_keys, DerivedKeys, DERIVED_KEY_LEN};
pub use layout::{
    to_internal, to_wire, FieldMap, APP_DATA_END, APP_DATA_OFFSET, FIELD_TABLE, HMAC_LEN,
    INTERNAL_SIZE, TAG_FILE_SIZE,
};
pub use seed::{calc_seed, KeygenSeed, KEYGEN_SEED_LEN};
