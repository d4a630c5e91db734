//! Error types for `totem-tag-core`.

use thiserror::Error;

/// Errors produced by key loading and buffer conversion.
///
/// Signature verification failure is deliberately **not** represented here:
/// `unpack` reports it as a boolean alongside the fully populated plaintext,
/// so callers can apply policy (reject, warn, or force-accept).
#[derive(Debug, Error)]
pub enum TagError {
    /// Key file missing or an I/O failure occurred while reading it.
    #[error("could not read key file: {0}")]
    KeyFileUnreadable(String),

    /// Key file content is structurally invalid (wrong size, oversized
    /// magic-byte count). No partial key set is ever returned.
    #[error("key file corrupt: {0}")]
    KeyFileCorrupt(String),

    /// Input buffer is shorter than the fixed size an operation requires.
    #[error("buffer too small: {got} bytes (expected at least {expected})")]
    BufferTooSmall {
        /// Minimum number of bytes the operation needs.
        expected: usize,
        /// Number of bytes actually supplied.
        got: usize,
    },
}
