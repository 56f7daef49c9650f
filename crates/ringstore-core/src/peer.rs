//! Peers, partitions and peer-set snapshots.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::hash::RingHash;

/// Default number of ring positions a peer owns.
pub const DEFAULT_PARTITIONS: u32 = 127;

/// A cluster member as seen by this node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Peer {
    /// Unique member name; also the reply-to identity on the wire.
    pub name: String,
    /// Where datagrams for this peer are sent.
    pub addr: SocketAddr,
    /// Number of ring positions this peer owns.
    pub partitions: u32,
}

impl Peer {
    /// Create a peer with the default partition count.
    pub fn new(name: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            name: name.into(),
            addr,
            partitions: DEFAULT_PARTITIONS,
        }
    }

    /// Override the partition count.
    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = partitions;
        self
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.addr)
    }
}

/// One ring position owned by a peer.
#[derive(Debug, Clone)]
pub struct Partition {
    pub peer: Arc<Peer>,
    pub index: u32,
    hash: RingHash,
}

impl Partition {
    pub fn new(peer: Arc<Peer>, index: u32) -> Self {
        let hash = RingHash::of_partition(&peer.name, index);
        Self { peer, index, hash }
    }

    /// Build a partition at an explicit ring position.
    ///
    /// Used to construct rings with chosen positions in tests and tools.
    pub fn at(peer: Arc<Peer>, index: u32, hash: RingHash) -> Self {
        Self { peer, index, hash }
    }

    pub fn hash(&self) -> RingHash {
        self.hash
    }
}

/// An immutable snapshot of the known peers, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PeerSet {
    peers: BTreeMap<String, Arc<Peer>>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Look up a peer by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Peer>> {
        self.peers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.peers.contains_key(name)
    }

    /// Iterate peers in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Peer>> {
        self.peers.values()
    }

    /// Every partition of every peer, unsorted.
    pub fn partitions(&self) -> Vec<Partition> {
        let total: usize = self.peers.values().map(|p| p.partitions as usize).sum();
        let mut partitions = Vec::with_capacity(total);
        for peer in self.peers.values() {
            for index in 0..peer.partitions {
                partitions.push(Partition::new(Arc::clone(peer), index));
            }
        }
        partitions
    }
}

impl FromIterator<Peer> for PeerSet {
    /// Later peers replace earlier ones with the same name.
    fn from_iter<I: IntoIterator<Item = Peer>>(iter: I) -> Self {
        Self {
            peers: iter
                .into_iter()
                .map(|p| (p.name.clone(), Arc::new(p)))
                .collect(),
        }
    }
}
