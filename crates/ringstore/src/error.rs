//! Error types for nodes and blobs.

use ringstore_core::Outcome;
use ringstore_proto::ProtoError;
use ringstore_store::StoreError;
use thiserror::Error;

/// Errors that can occur while starting or running a node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Protocol or transport error.
    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors that can occur during blob operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Access past the end of the blob.
    #[error("range {offset}..{end} out of bounds for blob of {size} bytes")]
    OutOfRange { offset: u64, end: u64, size: u64 },

    /// The root record could not be stored.
    #[error("blob create failed: {0}")]
    CreateFailed(Outcome),

    /// The root record could not be loaded.
    #[error("blob open failed: {0}")]
    OpenFailed(Outcome),

    /// A page could not be read.
    #[error("loading page {page} failed: {outcome}")]
    PageLoad { page: u64, outcome: Outcome },

    /// A page could not be written.
    #[error("storing page {page} failed: {outcome}")]
    PageStore { page: u64, outcome: Outcome },

    /// Stored data does not decode as expected.
    #[error("corrupt blob: {0}")]
    Corrupt(String),

    /// Blob parameters are unusable.
    #[error("invalid blob configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
