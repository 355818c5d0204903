//! Error types for frame encoding and decoding.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, ProtocolError>;

/// Errors from the frame builders and the packet decode path.
///
/// Oversize payloads are a caller precondition violation surfaced as
/// `PayloadTooLarge`; the builders perform no other validation. The
/// remaining variants belong to the decode path and indicate truncated or
/// malformed input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload exceeds the single-radio-frame ceiling for its protocol.
    #[error("payload too large: {size} bytes exceeds the {max}-byte limit")]
    PayloadTooLarge {
        /// Size of the rejected payload
        size: usize,
        /// Maximum the builder accepts
        max: usize,
    },

    /// Input ended before the structure it claims to hold.
    #[error("truncated packet: need {expected} bytes, have {actual}")]
    Truncated {
        /// Bytes the structure requires
        expected: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// A field tag other than the two the micro-encoding defines.
    #[error("unexpected field tag {tag:#04x} at offset {offset}")]
    UnexpectedTag {
        /// The tag byte encountered
        tag: u8,
        /// Offset of the tag within the buffer
        offset: usize,
    },

    /// A varint ran past the 64-bit value range.
    #[error("varint exceeds 64 bits")]
    VarintOverflow,
}
