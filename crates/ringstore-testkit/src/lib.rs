//! # Ringstore Testkit
//!
//! Testing utilities for Ringstore.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known messages with their exact wire bytes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: In-memory clusters for integration tests
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the datagram layout so that other implementations can
//! interoperate:
//!
//! ```rust
//! use ringstore_testkit::vectors::{all_vectors, expected_bytes, message_from_vector};
//!
//! for vector in all_vectors() {
//!     let encoded = message_from_vector(&vector).encode().unwrap();
//!     assert_eq!(&encoded[..], &expected_bytes(&vector)[..]);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ringstore_testkit::generators::{message_from_params, MessageParams};
//!
//! proptest! {
//!     #[test]
//!     fn message_roundtrips(params: MessageParams) {
//!         let message = message_from_params(&params);
//!         let decoded = Message::decode(&message.encode().unwrap()).unwrap();
//!         prop_assert_eq!(decoded, message);
//!     }
//! }
//! ```
//!
//! ## Test Clusters
//!
//! ```rust,no_run
//! use ringstore::ConsistencyLevel;
//! use ringstore_testkit::fixtures::TestCluster;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let cluster = TestCluster::start(3).await?;
//!     let outcome = cluster.node(0).client().store("k", "v", ConsistencyLevel::All).await;
//!     assert!(outcome.is_success());
//!     cluster.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{init_tracing, node_addr, TestCluster};
pub use generators::{message_from_params, MessageParams};
pub use vectors::{all_vectors, expected_bytes, message_from_vector, verify_all_vectors, WireVector};
