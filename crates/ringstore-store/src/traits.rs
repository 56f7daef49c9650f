//! Storage trait: the abstract interface for key/value entries.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Async interface for the entries a node stores for the cluster.
///
/// Implementations must be safe to share between the listener task and any
/// number of protocol tasks.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get the value stored under `key`.
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: Bytes, value: Bytes) -> Result<()>;

    /// Remove `key`. Returns whether it was present.
    async fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Check if `key` is present.
    async fn contains(&self, key: &[u8]) -> Result<bool>;

    /// Number of stored entries.
    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
