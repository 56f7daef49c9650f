//! In-memory implementation of the Storage trait.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::traits::Storage;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    entries: RwLock<HashMap<Bytes, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Bytes, Bytes>>> {
        self.entries.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Bytes, Bytes>>> {
        self.entries.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn put(&self, key: Bytes, value: Bytes) -> Result<()> {
        self.write()?.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<bool> {
        Ok(self.write()?.remove(key).is_some())
    }

    async fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.read()?.contains_key(key))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryStore::new();
        assert_eq!(store.get(b"a").await.unwrap(), None);

        store.put(Bytes::from("a"), Bytes::from("1")).await.unwrap();
        assert_eq!(store.get(b"a").await.unwrap(), Some(Bytes::from("1")));
        assert!(store.contains(b"a").await.unwrap());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryStore::new();
        store.put(Bytes::from("a"), Bytes::from("1")).await.unwrap();
        store.put(Bytes::from("a"), Bytes::from("2")).await.unwrap();

        assert_eq!(store.get(b"a").await.unwrap(), Some(Bytes::from("2")));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.put(Bytes::from("a"), Bytes::from("1")).await.unwrap();

        assert!(store.delete(b"a").await.unwrap());
        assert!(!store.delete(b"a").await.unwrap());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();

        for i in 0..16u32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for j in 0..32u32 {
                    let key = Bytes::from(format!("{}-{}", i, j));
                    store.put(key, Bytes::from(vec![i as u8])).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await.unwrap(), 16 * 32);
        assert_eq!(store.get(b"3-7").await.unwrap(), Some(Bytes::from(vec![3u8])));
    }

    #[tokio::test]
    async fn test_poisoned_lock_reported() {
        let store = Arc::new(MemoryStore::new());
        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.get(b"a").await, Err(StoreError::LockPoisoned)));
        assert!(matches!(
            store.put(Bytes::from("a"), Bytes::from("1")).await,
            Err(StoreError::LockPoisoned)
        ));
    }
}
