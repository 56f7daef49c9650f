//! Current cluster membership as seen by this node.
//!
//! Discovery lives outside this crate. It feeds whole peer sets through
//! [`Membership::replace`]; readers take an `Arc` snapshot and never observe
//! a half-updated set.

use std::sync::{Arc, RwLock};

use ringstore_core::{Peer, PeerSet};
use tokio::sync::broadcast;
use tracing::info;

const EVENT_CAPACITY: usize = 64;

/// Change notification emitted by [`Membership::replace`].
#[derive(Debug, Clone, PartialEq)]
pub enum MembershipEvent {
    Joined(Arc<Peer>),
    Left(Arc<Peer>),
}

/// Holder of the current peer snapshot.
pub struct Membership {
    peers: RwLock<Arc<PeerSet>>,
    events: broadcast::Sender<MembershipEvent>,
}

impl Membership {
    pub fn new() -> Self {
        Self::with_peers(PeerSet::new())
    }

    pub fn with_peers(peers: PeerSet) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            peers: RwLock::new(Arc::new(peers)),
            events,
        }
    }

    /// The current peer set.
    pub fn snapshot(&self) -> Arc<PeerSet> {
        // The guarded value is a single Arc; a poisoned lock still holds a
        // complete snapshot.
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&peers)
    }

    /// Swap in a new peer set and announce the differences.
    ///
    /// A peer whose address or partition count changed is reported as
    /// leaving and rejoining.
    pub fn replace(&self, peers: PeerSet) {
        let new = Arc::new(peers);
        let old = {
            let mut current = self.peers.write().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *current, Arc::clone(&new))
        };

        for peer in old.iter() {
            if new.get(&peer.name) != Some(peer) {
                info!(peer = %peer, "peer left");
                let _ = self.events.send(MembershipEvent::Left(Arc::clone(peer)));
            }
        }
        for peer in new.iter() {
            if old.get(&peer.name) != Some(peer) {
                info!(peer = %peer, "peer joined");
                let _ = self.events.send(MembershipEvent::Joined(Arc::clone(peer)));
            }
        }
    }

    /// Look up a peer by name in the current snapshot.
    pub fn resolve(&self, name: &str) -> Option<Arc<Peer>> {
        self.snapshot().get(name).cloned()
    }

    /// Receive joined/left notifications for future replacements.
    pub fn subscribe(&self) -> broadcast::Receiver<MembershipEvent> {
        self.events.subscribe()
    }

    /// Number of peers in the current snapshot.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl Default for Membership {
    fn default() -> Self {
        Self::new()
    }
}
