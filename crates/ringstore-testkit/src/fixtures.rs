//! Test fixtures and helpers.
//!
//! In-memory clusters for integration tests.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use ringstore::{
    MemoryNetwork, MemoryStore, Membership, Node, NodeConfig, Peer, PeerSet, Storage,
};
use tracing_subscriber::filter::LevelFilter;

/// First port handed out by [`node_addr`].
pub const BASE_PORT: u16 = 9991;

/// Timeouts short enough to keep failure-path tests fast.
pub const TEST_ACK_TIMEOUT: Duration = Duration::from_millis(200);
pub const TEST_PING_TIMEOUT: Duration = Duration::from_millis(200);

/// Address of the `index`-th node in a test cluster.
pub fn node_addr(index: usize) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, BASE_PORT + index as u16))
}

/// Install a test-friendly tracing subscriber. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(LevelFilter::WARN)
        .try_init();
}

/// Nodes named `node1`, `node2`, ... sharing one memory network.
///
/// Every node has its own membership view; all views start out holding the
/// full cluster.
pub struct TestCluster {
    network: Arc<MemoryNetwork>,
    nodes: Vec<Node<MemoryStore>>,
    peers: Vec<Peer>,
}

impl TestCluster {
    /// Start `size` nodes with test timeouts.
    pub async fn start(size: usize) -> anyhow::Result<Self> {
        Self::start_with(size, |_| {}).await
    }

    /// Start `size` nodes, letting `configure` adjust each node's config.
    pub async fn start_with(
        size: usize,
        configure: impl Fn(&mut NodeConfig),
    ) -> anyhow::Result<Self> {
        let network = MemoryNetwork::new();
        let mut nodes = Vec::with_capacity(size);

        for index in 0..size {
            let mut config = NodeConfig::new(format!("node{}", index + 1));
            config.protocol.ack_timeout = TEST_ACK_TIMEOUT;
            config.protocol.ping_timeout = TEST_PING_TIMEOUT;
            configure(&mut config);

            let transport = Arc::new(network.create_transport(node_addr(index)).await);
            let node = Node::start(
                config,
                Arc::new(Membership::new()),
                transport,
                Arc::new(MemoryStore::new()),
            )?;
            nodes.push(node);
        }

        let peers = nodes.iter().map(|node| node.as_peer()).collect();
        let cluster = Self {
            network,
            nodes,
            peers,
        };
        cluster.publish_peers();
        Ok(cluster)
    }

    pub fn node(&self, index: usize) -> &Node<MemoryStore> {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[Node<MemoryStore>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn network(&self) -> &Arc<MemoryNetwork> {
        &self.network
    }

    /// The peer set every node currently sees.
    pub fn peer_set(&self) -> PeerSet {
        self.peers.iter().cloned().collect()
    }

    /// Add a member nobody can reach: it owns ring positions but has no
    /// transport attached, so everything sent to it is lost.
    pub fn add_unreachable_peer(&mut self, name: &str) -> Peer {
        let peer = Peer::new(name, node_addr(self.peers.len() + 1000));
        self.peers.push(peer.clone());
        self.publish_peers();
        peer
    }

    /// Detach node `index` from the network. Its listener stops; peers keep
    /// it in their views.
    pub async fn isolate(&self, index: usize) -> bool {
        self.network.disconnect(&node_addr(index)).await
    }

    /// Indices of the nodes holding `key` in local storage.
    pub async fn holders(&self, key: &[u8]) -> anyhow::Result<Vec<usize>> {
        let mut holders = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if node.storage().contains(key).await? {
                holders.push(index);
            }
        }
        Ok(holders)
    }

    fn publish_peers(&self) {
        for node in &self.nodes {
            node.membership().replace(self.peer_set());
        }
    }

    /// Stop every node.
    pub async fn shutdown(self) {
        for node in self.nodes {
            node.shutdown().await;
        }
    }
}
