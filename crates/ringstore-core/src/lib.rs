//! # Ringstore Core
//!
//! Pure primitives for Ringstore: the wire format, the hash ring and the
//! consistency model.
//!
//! This crate contains no I/O, no storage, no networking and no logging. It is
//! pure computation over ring positions and byte layouts.
//!
//! ## Key Types
//!
//! - [`Message`] - Fixed-layout datagram exchanged between peers
//! - [`RingHash`] - 128-bit position on the hash ring
//! - [`Ring`] - Sorted partitions of a peer snapshot; maps keys to replicas
//! - [`ConsistencyLevel`] - How many replicas an operation must reach
//! - [`Outcome`] - Client-visible result of a replicated operation
//!
//! ## Ring Ordering
//!
//! Positions compare as unsigned 128-bit integers and wrap at the maximum.
//! See [`clockwise`] for the ordering predicate used by ring lookup.

pub mod consistency;
pub mod envelope;
pub mod error;
pub mod hash;
pub mod message;
pub mod outcome;
pub mod peer;
pub mod ring;

pub use consistency::{ConsistencyLevel, UnknownLevel};
pub use envelope::KeyValue;
pub use error::{CoreError, EnvelopeError, RingError, WireError};
pub use hash::{clockwise, RingHash};
pub use message::{
    subop, Message, OpType, HEADER_SIZE, MAX_PAYLOAD, MAX_REPLY_TO, PROTOCOL_VERSION,
};
pub use outcome::Outcome;
pub use peer::{Partition, Peer, PeerSet, DEFAULT_PARTITIONS};
pub use ring::Ring;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
