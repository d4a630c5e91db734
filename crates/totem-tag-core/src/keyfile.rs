//! Master key records and the two-record key file.
//!
//! This module provides:
//! - [`MasterKeyRecord`]: one 64-byte key record (type string, magic bytes,
//!   xor pad)
//! - [`MasterKeySet`]: the data + tag record pair, loaded once per process
//! - [`load_keys`]: read a key set from a key file on disk
//!
//! # Key File Layout
//!
//! Two fixed-size records back-to-back, no header, no length prefix. The
//! user-data record first, then the hardware-identity record:
//!
//! ```text
//! 0x00..0x0E  type string (14 bytes)
//! 0x0E..0x0F  reserved
//! 0x0F..0x10  magic bytes size (must be <= 16)
//! 0x10..0x20  magic bytes buffer (only the first `magic bytes size` count)
//! 0x20..0x40  xor pad (secret derivation key)
//! ```
//!
//! A file of any other total length, or a record whose magic-byte count
//! exceeds the buffer, is rejected as corrupt. No partial key set is ever
//! returned.

use crate::error::TagError;
use std::fmt;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of a record's type string.
pub const TYPE_STRING_LEN: usize = 14;

/// Capacity of a record's magic-byte buffer.
pub const MAGIC_CAPACITY: usize = 16;

/// Length of a record's xor pad (the derivation key).
pub const XOR_PAD_LEN: usize = 32;

/// On-disk size of one master key record.
pub const KEY_RECORD_LEN: usize = 64;

/// On-disk size of a key file: exactly two records.
pub const KEY_FILE_LEN: usize = 128;

/// Record-relative offset of the magic-byte count.
const MAGIC_SIZE_OFFSET: usize = 0x0F;

/// Record-relative offset of the magic-byte buffer.
const MAGIC_OFFSET: usize = 0x10;

/// Record-relative offset of the xor pad.
const XOR_PAD_OFFSET: usize = 0x20;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One master key record: long-lived secret material from which every
/// per-tag key is derived.
///
/// The xor pad is the secret part; it is zeroized on drop and masked in
/// `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKeyRecord {
    type_string: [u8; TYPE_STRING_LEN],
    magic_size: u8,
    magic: [u8; MAGIC_CAPACITY],
    xor_pad: [u8; XOR_PAD_LEN],
}

impl MasterKeyRecord {
    /// Parse one record from its 64-byte on-disk form.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::KeyFileCorrupt`] if the magic-byte count exceeds
    /// [`MAGIC_CAPACITY`].
    pub fn from_bytes(raw: &[u8; KEY_RECORD_LEN]) -> Result<Self, TagError> {
        let magic_size = raw[MAGIC_SIZE_OFFSET];
        if usize::from(magic_size) > MAGIC_CAPACITY {
            return Err(TagError::KeyFileCorrupt(format!(
                "magic byte count {magic_size} exceeds capacity {MAGIC_CAPACITY}"
            )));
        }

        let mut type_string = [0u8; TYPE_STRING_LEN];
        type_string.copy_from_slice(&raw[..TYPE_STRING_LEN]);

        let mut magic = [0u8; MAGIC_CAPACITY];
        magic.copy_from_slice(&raw[MAGIC_OFFSET..XOR_PAD_OFFSET]);

        let mut xor_pad = [0u8; XOR_PAD_LEN];
        xor_pad.copy_from_slice(&raw[XOR_PAD_OFFSET..]);

        Ok(Self {
            type_string,
            magic_size,
            magic,
            xor_pad,
        })
    }

    /// The record's type string (domain label fed into key derivation).
    #[must_use]
    pub const fn type_string(&self) -> &[u8; TYPE_STRING_LEN] {
        &self.type_string
    }

    /// The meaningful prefix of the magic-byte buffer.
    #[must_use]
    pub fn magic(&self) -> &[u8] {
        &self.magic[..usize::from(self.magic_size)]
    }

    /// Number of meaningful magic bytes.
    #[must_use]
    pub const fn magic_size(&self) -> u8 {
        self.magic_size
    }

    /// The 32-byte xor pad that keys the derivation keystream.
    #[must_use]
    pub(crate) const fn xor_pad(&self) -> &[u8; XOR_PAD_LEN] {
        &self.xor_pad
    }
}

impl fmt::Debug for MasterKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKeyRecord")
            .field("type_string", &self.type_string)
            .field("magic_size", &self.magic_size)
            .field("xor_pad", &"***")
            .finish_non_exhaustive()
    }
}

/// The process-wide master key pair: the user-data record and the
/// hardware-identity record.
///
/// Created once by [`load_keys`] (or [`MasterKeySet::from_bytes`]) and
/// read-only afterwards. Plain byte arrays, so the set is `Send + Sync` and
/// safe to share across threads.
#[derive(Clone, Debug)]
pub struct MasterKeySet {
    data: MasterKeyRecord,
    tag: MasterKeyRecord,
}

impl MasterKeySet {
    /// Parse a key set from the raw 128-byte key-file content.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::KeyFileCorrupt`] if the content is not exactly
    /// [`KEY_FILE_LEN`] bytes or either record is invalid.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, TagError> {
        if raw.len() != KEY_FILE_LEN {
            return Err(TagError::KeyFileCorrupt(format!(
                "key file is {} bytes (expected exactly {KEY_FILE_LEN})",
                raw.len()
            )));
        }

        let (data_raw, tag_raw) = raw.split_at(KEY_RECORD_LEN);
        // The length guard above makes both halves exactly KEY_RECORD_LEN.
        let data_raw: &[u8; KEY_RECORD_LEN] = data_raw
            .try_into()
            .map_err(|_| TagError::KeyFileCorrupt("data record truncated".into()))?;
        let tag_raw: &[u8; KEY_RECORD_LEN] = tag_raw
            .try_into()
            .map_err(|_| TagError::KeyFileCorrupt("tag record truncated".into()))?;

        Ok(Self {
            data: MasterKeyRecord::from_bytes(data_raw)?,
            tag: MasterKeyRecord::from_bytes(tag_raw)?,
        })
    }

    /// The user-data record (authenticates and encrypts the payload).
    #[must_use]
    pub const fn data(&self) -> &MasterKeyRecord {
        &self.data
    }

    /// The hardware-identity record (authenticates the static fields).
    #[must_use]
    pub const fn tag(&self) -> &MasterKeyRecord {
        &self.tag
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`MasterKeySet`] from a key file.
///
/// # Errors
///
/// Returns [`TagError::KeyFileUnreadable`] if the file is missing or cannot
/// be read, and [`TagError::KeyFileCorrupt`] if its content is structurally
/// invalid. Either way no partial key set escapes.
pub fn load_keys(path: impl AsRef<Path>) -> Result<MasterKeySet, TagError> {
    let raw = std::fs::read(path.as_ref())
        .map_err(|e| TagError::KeyFileUnreadable(format!("{}: {e}", path.as_ref().display())))?;
    MasterKeySet::from_bytes(&raw)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
