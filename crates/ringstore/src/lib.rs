//! # Ringstore
//!
//! A peer-to-peer replicated key/value store over a consistent-hash ring.
//!
//! ## Overview
//!
//! Every node is both client and server. For any key it computes the ordered
//! set of peers that must hold a copy, sends them replicated requests over
//! UDP and reports how many acknowledged:
//!
//! - **Store / Load**: replicated writes and reads with read repair
//! - **Ping**: liveness check of a single peer
//! - **Blobs**: fixed-size byte arrays paged over the key/value store
//!
//! ## Key Concepts
//!
//! - **Ring**: every peer owns many pseudo-random positions; a key belongs to
//!   the position at or before its hash, then to the next distinct peers
//!   counter-clockwise.
//! - **Consistency level**: how many replicas must be reached, lowered
//!   automatically for clusters too small to satisfy it.
//! - **Outcome**: success, partial success, failure, timeout or error.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ringstore::{ConsistencyLevel, Membership, MemoryStore, Node, NodeConfig, UdpTransport};
//!
//! async fn example() -> ringstore::Result<()> {
//!     let transport = Arc::new(UdpTransport::bind("0.0.0.0:9991").await?);
//!     let membership = Arc::new(Membership::new());
//!     let node = Node::start(
//!         NodeConfig::new("node1"),
//!         membership,
//!         transport,
//!         Arc::new(MemoryStore::new()),
//!     )?;
//!
//!     // Discovery feeds the peer set, including this node.
//!     node.membership().replace(vec![node.as_peer()].into_iter().collect());
//!
//!     node.client().store("key", "value", ConsistencyLevel::One).await;
//!     let (value, outcome) = node.client().load("key", ConsistencyLevel::One).await;
//!     println!("{:?} {}", value, outcome);
//!
//!     node.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `ringstore::core` - Wire format, hash ring, consistency levels
//! - `ringstore::store` - Storage abstraction
//! - `ringstore::proto` - FSA runtime, transports and protocols

pub mod blob;
pub mod config;
pub mod error;
pub mod node;

// Re-export component crates
pub use ringstore_core as core;
pub use ringstore_proto as proto;
pub use ringstore_store as store;

// Re-export main types for convenience
pub use blob::Blob;
pub use config::{BlobConfig, NodeConfig};
pub use error::{BlobError, NodeError, Result};
pub use node::Node;

// Re-export commonly used component types
pub use ringstore_core::{ConsistencyLevel, Outcome, Peer, PeerSet, RingHash};
pub use ringstore_proto::{
    Client, Membership, MembershipEvent, MemoryNetwork, ProtocolConfig, Transport, UdpTransport,
};
pub use ringstore_store::{MemoryStore, Storage};
