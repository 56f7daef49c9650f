//! # Ringstore Store
//!
//! Storage backend for Ringstore. Provides a trait-based interface for the
//! key/value entries a node holds on behalf of the cluster.
//!
//! ## Overview
//!
//! The server side of the Store and Load protocols writes and reads through
//! the [`Storage`] trait, so the node is backend-agnostic. The shipped
//! implementation is [`MemoryStore`]; nothing is persisted across restarts.
//!
//! ## Key Types
//!
//! - [`Storage`] - The async trait for all storage operations
//! - [`MemoryStore`] - In-memory storage safe for concurrent access
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use ringstore_store::{MemoryStore, Storage};
//!
//! async fn example() {
//!     let store = MemoryStore::new();
//!     store.put(Bytes::from("key"), Bytes::from("value")).await.unwrap();
//!     let value = store.get(b"key").await.unwrap();
//!     assert_eq!(value.as_deref(), Some(&b"value"[..]));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Last writer wins**: `put` replaces any existing value without ordering
//! - **Opaque bytes**: keys and values are never interpreted

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use traits::Storage;
