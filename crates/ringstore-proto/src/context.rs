//! Per-node protocol context shared by every protocol instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringstore_core::{ConsistencyLevel, Message, OpType, Peer, Ring, RingError};
use tracing::warn;

use crate::config::ProtocolConfig;
use crate::error::Result;
use crate::membership::Membership;
use crate::router::Router;
use crate::transport::Transport;

/// Everything a protocol instance needs from its node.
pub struct Context {
    /// This node's member name; the reply-to identity on the wire.
    pub name: String,
    pub config: ProtocolConfig,
    pub membership: Arc<Membership>,
    pub transport: Arc<dyn Transport>,
    pub router: Router,
    next_request_id: AtomicU64,
}

impl Context {
    pub fn new(
        name: impl Into<String>,
        config: ProtocolConfig,
        membership: Arc<Membership>,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            config,
            membership,
            transport,
            router: Router::new(),
            next_request_id: AtomicU64::new(rand::random()),
        })
    }

    /// A fresh request id for correlating replies.
    pub fn next_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Build the ring for the current membership snapshot.
    pub fn ring(&self) -> std::result::Result<Ring, RingError> {
        Ring::build(&self.membership.snapshot())
    }

    /// Lower `level` to what a cluster of `cluster_size` can satisfy.
    pub fn adjusted_level(&self, level: ConsistencyLevel, cluster_size: usize) -> ConsistencyLevel {
        let adjusted = level.adjusted(cluster_size);
        if adjusted != level {
            warn!(
                requested = %level,
                adjusted = %adjusted,
                cluster_size,
                "consistency level downgraded for small cluster"
            );
        }
        adjusted
    }

    /// A request from this node, stamped with the configured version.
    pub fn request(&self, op: OpType, subop: u8) -> Message {
        Message::new(op, subop, self.name.as_str()).with_version(self.config.protocol_version)
    }

    /// This node's answer to `request`.
    pub fn reply(&self, request: &Message, subop: u8) -> Message {
        request
            .reply(subop, self.name.as_str())
            .with_version(self.config.protocol_version)
    }

    /// Encode `message` and send it to `peer`.
    pub async fn send_to(&self, peer: &Peer, message: &Message) -> Result<()> {
        let datagram = message.encode()?;
        self.transport.send(peer.addr, datagram).await
    }
}
