//! Fixed-size byte arrays paged over the key/value store.
//!
//! A blob named `key` keeps a CBOR root record `{ size }` under `key` itself
//! and its contents in pages stored under `key.XXXXXXXX`, where the suffix is
//! the page number in eight hex digits. A page that every replica reports
//! missing reads as zeros; a page no replica answers for is an error. Every
//! access round-trips its pages through the cluster; nothing is cached.

use bytes::{BufMut, Bytes, BytesMut};
use ringstore_core::ConsistencyLevel;
use ringstore_proto::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BlobError;

/// The record stored under the blob key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct BlobRoot {
    size: u64,
}

impl BlobRoot {
    fn encode(&self) -> Result<Bytes, BlobError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| BlobError::Corrupt(e.to_string()))?;
        Ok(Bytes::from(buf))
    }

    fn decode(bytes: &[u8]) -> Result<Self, BlobError> {
        ciborium::from_reader(bytes).map_err(|e| BlobError::Corrupt(e.to_string()))
    }
}

/// Handle to a blob. Cheap to keep around; holds no data.
#[derive(Clone)]
pub struct Blob {
    client: Client,
    key: Bytes,
    size: u64,
    page_size: usize,
    level: ConsistencyLevel,
}

impl Blob {
    /// Store a root record for a new blob of `size` bytes.
    ///
    /// Existing pages under the same key are not cleared.
    pub async fn create(
        client: Client,
        key: impl Into<Bytes>,
        size: u64,
        page_size: usize,
        level: ConsistencyLevel,
    ) -> Result<Self, BlobError> {
        if page_size == 0 {
            return Err(BlobError::InvalidConfig("page_size must be positive".into()));
        }

        let key = key.into();
        let root = BlobRoot { size }.encode()?;
        let outcome = client.store(key.clone(), root, level).await;
        if !outcome.is_acknowledged() {
            return Err(BlobError::CreateFailed(outcome));
        }

        debug!(size, page_size, %outcome, "blob created");
        Ok(Self {
            client,
            key,
            size,
            page_size,
            level,
        })
    }

    /// Load the root record of an existing blob.
    pub async fn open(
        client: Client,
        key: impl Into<Bytes>,
        page_size: usize,
        level: ConsistencyLevel,
    ) -> Result<Self, BlobError> {
        if page_size == 0 {
            return Err(BlobError::InvalidConfig("page_size must be positive".into()));
        }

        let key = key.into();
        let (value, outcome) = client.load(key.clone(), level).await;
        let root = match value {
            Some(bytes) => BlobRoot::decode(&bytes)?,
            None => return Err(BlobError::OpenFailed(outcome)),
        };

        Ok(Self {
            client,
            key,
            size: root.size,
            page_size,
            level,
        })
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// Declared size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages backing the blob.
    pub fn page_count(&self) -> u64 {
        self.size.div_ceil(self.page_size as u64)
    }

    pub fn level(&self) -> ConsistencyLevel {
        self.level
    }

    /// Key of the page holding `offset`.
    pub fn page_key(&self, offset: u64) -> Bytes {
        self.key_of_page(offset / self.page_size as u64)
    }

    fn key_of_page(&self, page: u64) -> Bytes {
        let suffix = format!(".{:08x}", page);
        let mut key = BytesMut::with_capacity(self.key.len() + suffix.len());
        key.put_slice(&self.key);
        key.put_slice(suffix.as_bytes());
        key.freeze()
    }

    fn check_range(&self, offset: u64, len: usize) -> Result<(), BlobError> {
        let end = offset.checked_add(len as u64).unwrap_or(u64::MAX);
        if end > self.size || (len > 0 && offset >= self.size) {
            return Err(BlobError::OutOfRange {
                offset,
                end,
                size: self.size,
            });
        }
        Ok(())
    }

    async fn load_page(&self, page: u64) -> Result<Vec<u8>, BlobError> {
        let state = self.client.load_state(self.key_of_page(page), self.level).await;
        if state.all_nacked() {
            // Every replica answered without the page: never written.
            return Ok(vec![0u8; self.page_size]);
        }

        let outcome = state.outcome();
        let bytes = state
            .into_value()
            .ok_or(BlobError::PageLoad { page, outcome })?;
        if bytes.len() > self.page_size {
            return Err(BlobError::Corrupt(format!(
                "page {} holds {} bytes, page size is {}",
                page,
                bytes.len(),
                self.page_size
            )));
        }
        let mut data = bytes.to_vec();
        data.resize(self.page_size, 0);
        Ok(data)
    }

    async fn store_page(&self, page: u64, data: Vec<u8>) -> Result<(), BlobError> {
        let outcome = self
            .client
            .store(self.key_of_page(page), data, self.level)
            .await;
        if outcome.is_acknowledged() {
            Ok(())
        } else {
            Err(BlobError::PageStore { page, outcome })
        }
    }

    /// Read the byte at `offset`.
    pub async fn read_byte_at(&self, offset: u64) -> Result<u8, BlobError> {
        self.check_range(offset, 1)?;
        let page = offset / self.page_size as u64;
        let data = self.load_page(page).await?;
        Ok(data[(offset % self.page_size as u64) as usize])
    }

    /// Write the byte at `offset`, rewriting its whole page.
    pub async fn write_byte_at(&self, offset: u64, byte: u8) -> Result<(), BlobError> {
        self.check_range(offset, 1)?;
        let page = offset / self.page_size as u64;
        let mut data = self.load_page(page).await?;
        data[(offset % self.page_size as u64) as usize] = byte;
        self.store_page(page, data).await
    }

    /// Fill `buf` from `offset`, loading each touched page once.
    pub async fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<(), BlobError> {
        self.check_range(offset, buf.len())?;

        let mut done = 0;
        while done < buf.len() {
            let at = offset + done as u64;
            let page = at / self.page_size as u64;
            let within = (at % self.page_size as u64) as usize;
            let take = (self.page_size - within).min(buf.len() - done);

            let data = self.load_page(page).await?;
            buf[done..done + take].copy_from_slice(&data[within..within + take]);
            done += take;
        }
        Ok(())
    }

    /// Write `data` at `offset`, rewriting each touched page once.
    pub async fn write_at(&self, data: &[u8], offset: u64) -> Result<(), BlobError> {
        self.check_range(offset, data.len())?;

        let mut done = 0;
        while done < data.len() {
            let at = offset + done as u64;
            let page = at / self.page_size as u64;
            let within = (at % self.page_size as u64) as usize;
            let take = (self.page_size - within).min(data.len() - done);

            // Whole-page overwrites skip the read.
            let mut contents = if within == 0 && take == self.page_size {
                vec![0u8; self.page_size]
            } else {
                self.load_page(page).await?
            };
            contents[within..within + take].copy_from_slice(&data[done..done + take]);
            self.store_page(page, contents).await?;
            done += take;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("key", &self.key)
            .field("size", &self.size)
            .field("page_size", &self.page_size)
            .field("level", &self.level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_record_roundtrip() {
        let root = BlobRoot { size: 2000 };
        assert_eq!(BlobRoot::decode(&root.encode().unwrap()).unwrap(), root);
        assert!(matches!(
            BlobRoot::decode(b"\xff"),
            Err(BlobError::Corrupt(_))
        ));
    }
}
