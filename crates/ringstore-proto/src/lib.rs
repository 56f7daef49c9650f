//! # Ringstore Proto
//!
//! Replication protocols for Ringstore and the runtime that drives them.
//!
//! ## Overview
//!
//! Every client operation is a small finite-state automaton ([`fsa`]) running
//! on its own task. Store and Load share one aggregation automaton
//! ([`quorum`]) that fans a request out to the replicas of a key and folds
//! their acknowledgements into an [`Outcome`](ringstore_core::Outcome). Ping
//! checks a single peer. The [`Dispatcher`] answers requests from other
//! nodes and forwards replies to the waiting automaton through the
//! [`Router`].
//!
//! ## Key Properties
//!
//! - **One result per operation**: every automaton publishes exactly once
//! - **Bounded waits**: acknowledgements and pongs are awaited with timeouts
//! - **No leaks**: finished operations abort their sends and drop their route
//! - **Lossy transport**: datagrams may vanish; timeouts are the only retry
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ringstore_core::ConsistencyLevel;
//! use ringstore_proto::{Client, Context, Membership, ProtocolConfig, UdpTransport};
//!
//! async fn example() -> ringstore_proto::Result<()> {
//!     let transport = Arc::new(UdpTransport::bind("0.0.0.0:9991").await?);
//!     let membership = Arc::new(Membership::new());
//!     let ctx = Context::new("node1", ProtocolConfig::default(), membership, transport);
//!
//!     let client = Client::new(ctx);
//!     let outcome = client.store("key", "value", ConsistencyLevel::Quorum).await;
//!     println!("store: {}", outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Requester                           Replica
//!   |-------- STORE/PUT ------------->|
//!   |<------- STORE/ACK --------------|
//!   |-------- LOAD/GET -------------->|
//!   |<------- LOAD/ACK | LOAD/NACK ---|
//!   |-------- PING/PING ------------->|
//!   |<------- PING/PONG --------------|
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod fsa;
pub mod load;
pub mod membership;
pub mod ping;
pub mod quorum;
pub mod router;
pub mod store;
pub mod transport;

pub use client::Client;
pub use config::ProtocolConfig;
pub use context::Context;
pub use dispatch::Dispatcher;
pub use error::{ProtoError, Result};
pub use fsa::{Automaton, Fsa, InputSender, Timeout};
pub use membership::{Membership, MembershipEvent};
pub use quorum::{QuorumState, Replicated, Reply};
pub use router::Router;
pub use transport::{
    memory::MemoryNetwork, memory::MemoryTransport, udp::UdpTransport, Transport,
};
