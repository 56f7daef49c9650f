//! Error types for ringstore core.

use thiserror::Error;

use crate::hash::RingHash;

/// Errors produced by the wire codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("packet is too small: {len} bytes, header needs {needed}")]
    PacketTooSmall { len: usize, needed: usize },

    #[error("payload truncated: header declares {declared} bytes, {available} available")]
    Truncated { declared: usize, available: usize },

    #[error("payload too large: {len} bytes, max {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("reply-to identity too long: {len} bytes, max {max}")]
    ReplyToTooLong { len: usize, max: usize },

    #[error("invalid reply-to identity: {0}")]
    InvalidReplyTo(String),

    #[error("unknown operation type: {0:#04x}")]
    UnknownOperation(u8),
}

/// Errors produced while building or querying the hash ring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// Two ring positions (or a key and a position) share a hash, so their
    /// order on the ring is undefined.
    #[error("hash collision on the ring at {0}")]
    Collision(RingHash),

    #[error("ring has no partitions")]
    Empty,
}

/// Errors produced by the payload envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("encoding error: {0}")]
    Encode(String),

    #[error("decoding error: {0}")]
    Decode(String),

    #[error("envelope too large: {len} bytes, max {max}")]
    TooLarge { len: usize, max: usize },
}

/// Umbrella error for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("ring error: {0}")]
    Ring(#[from] RingError),

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
}
