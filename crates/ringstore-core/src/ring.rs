//! The consistent-hash ring.
//!
//! The ring is the sorted sequence of every partition of every known peer.
//! It is cheap to rebuild and is derived from a [`PeerSet`] snapshot on
//! demand; nothing about it is persisted.

use std::sync::Arc;

use crate::error::RingError;
use crate::hash::{clockwise, RingHash};
use crate::peer::{Partition, Peer, PeerSet};

/// A sorted, collision-free sequence of partitions.
#[derive(Debug, Clone)]
pub struct Ring {
    partitions: Vec<Partition>,
}

impl Ring {
    /// Build the ring for a peer snapshot.
    pub fn build(peers: &PeerSet) -> Result<Self, RingError> {
        Self::from_partitions(peers.partitions())
    }

    /// Sort partitions by hash, rejecting duplicate positions.
    pub fn from_partitions(mut partitions: Vec<Partition>) -> Result<Self, RingError> {
        partitions.sort_by_key(|p| p.hash());

        if let Some(pair) = partitions.windows(2).find(|w| w[0].hash() == w[1].hash()) {
            return Err(RingError::Collision(pair[0].hash()));
        }

        Ok(Self { partitions })
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Partitions in ring order.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    fn hash_at(&self, i: usize) -> RingHash {
        self.partitions[i].hash()
    }

    /// Index of the partition owning `key`: the partition at `key` or its
    /// immediate predecessor, wrapping to the last partition for keys that
    /// sort before the first one.
    pub fn pivot(&self, key: RingHash) -> Result<usize, RingError> {
        let n = self.partitions.len();
        match n {
            0 => return Err(RingError::Empty),
            1 => return Ok(0),
            _ => {}
        }

        // A key sitting exactly on a position is owned by it; clockwise()
        // cannot order it.
        if let Ok(i) = self.partitions.binary_search_by_key(&key, |p| p.hash()) {
            return Ok(i);
        }

        let (mut l, mut r) = (0, n - 1);
        if clockwise(self.hash_at(r), key, self.hash_at(l))? {
            return Ok(r);
        }

        // Invariant: key lies strictly between positions l and r.
        while r - l > 1 {
            let m = l + (r - l) / 2;
            if clockwise(self.hash_at(m), key, self.hash_at(r))? {
                l = m;
            } else {
                r = m;
            }
        }

        Ok(l)
    }

    /// The peer owning the primary partition for `key`.
    pub fn primary(&self, key: RingHash) -> Result<Arc<Peer>, RingError> {
        let pivot = self.pivot(key)?;
        Ok(Arc::clone(&self.partitions[pivot].peer))
    }

    /// Up to `copies` distinct peers responsible for `key`, primary first.
    ///
    /// Walks backward from the pivot, skipping peers already chosen, and
    /// stops after one full lap if the ring has fewer distinct peers.
    pub fn hash_nodes(&self, key: RingHash, copies: usize) -> Result<Vec<Arc<Peer>>, RingError> {
        let pivot = self.pivot(key)?;
        let n = self.partitions.len();
        let mut nodes: Vec<Arc<Peer>> = Vec::with_capacity(copies);

        for step in 0..n {
            if nodes.len() >= copies {
                break;
            }
            let peer = &self.partitions[(pivot + n - step) % n].peer;
            if !nodes.iter().any(|chosen| chosen.name == peer.name) {
                nodes.push(Arc::clone(peer));
            }
        }

        Ok(nodes)
    }
}
