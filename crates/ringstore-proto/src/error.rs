//! Error types for the protocol layer.

use thiserror::Error;

/// Errors that can occur while running protocols or moving datagrams.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Encoding or decoding a wire message failed.
    #[error("wire error: {0}")]
    Wire(#[from] ringstore_core::WireError),

    /// Ring construction or lookup failed.
    #[error("ring error: {0}")]
    Ring(#[from] ringstore_core::RingError),

    /// Payload envelope could not be built or parsed.
    #[error("envelope error: {0}")]
    Envelope(#[from] ringstore_core::EnvelopeError),

    /// Storage backend failed.
    #[error("store error: {0}")]
    Store(#[from] ringstore_store::StoreError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Socket I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport will never deliver another datagram.
    #[error("transport closed")]
    Closed,

    /// A peer name is not in the current membership.
    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    /// A protocol instance went away without publishing a result.
    #[error("protocol aborted")]
    Aborted,
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;
