//! Client API over the replication protocols.

use std::sync::Arc;

use bytes::Bytes;
use ringstore_core::{ConsistencyLevel, Outcome, Partition, Peer, Ring, RingError, RingHash};
use tracing::{info, warn};

use crate::context::Context;
use crate::quorum::QuorumState;
use crate::{load, ping, store};

/// Entry point for store, load and ping. Cheap to clone.
#[derive(Clone)]
pub struct Client {
    ctx: Arc<Context>,
}

impl Client {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Replicate `value` under `key`.
    pub async fn store(
        &self,
        key: impl Into<Bytes>,
        value: impl Into<Bytes>,
        level: ConsistencyLevel,
    ) -> Outcome {
        store::store(Arc::clone(&self.ctx), key.into(), value.into(), level).await
    }

    /// Read `key`.
    ///
    /// A partially successful read stores the recovered value back at the
    /// same level before returning. The repair's outcome is logged only.
    pub async fn load(&self, key: impl Into<Bytes>, level: ConsistencyLevel) -> (Option<Bytes>, Outcome) {
        let state = self.load_state(key, level).await;
        let outcome = state.outcome();
        (state.into_value(), outcome)
    }

    /// Like [`load`](Self::load), but returns the final quorum state, which
    /// tells a key nobody holds apart from replicas that never answered.
    pub async fn load_state(&self, key: impl Into<Bytes>, level: ConsistencyLevel) -> QuorumState<Bytes> {
        let key = key.into();
        let state = load::load(Arc::clone(&self.ctx), key.clone(), level).await;

        if let QuorumState::PartialSuccess(value) = &state {
            let repair = store::store(Arc::clone(&self.ctx), key, value.clone(), level).await;
            if repair.is_success() {
                info!(outcome = %repair, "read repair finished");
            } else {
                warn!(outcome = %repair, "read repair incomplete");
            }
        }
        state
    }

    /// Check whether the peer called `name` answers.
    pub async fn ping(&self, name: &str) -> Outcome {
        ping::ping(Arc::clone(&self.ctx), name).await
    }

    /// Peers that hold `key` at `level`, primary first.
    pub fn hash_nodes(
        &self,
        key: RingHash,
        level: ConsistencyLevel,
    ) -> Result<Vec<Arc<Peer>>, RingError> {
        let peers = self.ctx.membership.snapshot();
        let level = self.ctx.adjusted_level(level, peers.len());
        Ring::build(&peers)?.hash_nodes(key, level.copies(peers.len()))
    }

    /// Current members in name order.
    pub fn peers(&self) -> Vec<Arc<Peer>> {
        self.ctx.membership.snapshot().iter().cloned().collect()
    }

    /// Current ring partitions in ring order.
    pub fn partitions(&self) -> Result<Vec<Partition>, RingError> {
        Ok(self.ctx.ring()?.partitions().to_vec())
    }
}
