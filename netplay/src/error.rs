//! Error type shared by every encode and decode path.

use thiserror::Error;

/// Failure of a single encode or decode call.
///
/// Errors are local to the call that produced them. Nothing is retried inside
/// the codec and a failed decode never yields a partially built value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A write would run past the end of the buffer.
    #[error("capacity exceeded: writing {requested} bits at bit {bit_pos} overflows {capacity}-bit buffer")]
    CapacityExceeded {
        bit_pos: usize,
        requested: usize,
        capacity: usize,
    },

    /// A read would run past the readable bits (truncated or corrupt input).
    #[error("buffer underflow: reading {requested} bits at bit {read_pos}, only {available} readable")]
    Underflow {
        read_pos: usize,
        requested: usize,
        available: usize,
    },

    /// Bit width outside `0..=64`.
    #[error("bit width {width} exceeds 64")]
    InvalidWidth { width: usize },

    /// Enum tag that maps to no declared variant.
    #[error("unknown {type_name} variant tag {tag}")]
    UnknownVariant { type_name: &'static str, tag: u64 },

    /// Collection longer than its declared maximum.
    #[error("length {len} of {field} exceeds max_len {max}")]
    LengthExceeded {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Packet header carries a different schema version.
    #[error("schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u8, found: u8 },

    /// Packet header carries a different packet kind than the one being decoded.
    #[error("unexpected packet kind: expected {expected:?}, found {found:?}")]
    UnexpectedKind {
        expected: crate::packet::PacketKind,
        found: crate::packet::PacketKind,
    },
}

/// Result alias used across the crate.
pub type CodecResult<T> = Result<T, CodecError>;
