//! Datagram transport abstraction.
//!
//! Peers exchange unicast datagrams with no delivery guarantee. Protocol
//! timeouts are the only retransmission policy, so implementations may drop
//! datagrams freely.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Largest datagram a transport must be able to carry.
pub const MAX_DATAGRAM: usize = 0xFFFF;

/// Transport trait for sending and receiving datagrams.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a datagram to `to`. Success does not imply delivery.
    async fn send(&self, to: SocketAddr, datagram: Bytes) -> Result<()>;

    /// Receive the next datagram and its source address.
    async fn recv(&self) -> Result<(SocketAddr, Bytes)>;

    /// Receive with timeout.
    ///
    /// Returns None if timeout expires before a datagram arrives.
    async fn recv_timeout(&self, timeout: Duration) -> Result<Option<(SocketAddr, Bytes)>>;

    /// The address peers send to in order to reach this transport.
    fn local_addr(&self) -> SocketAddr;
}

/// An in-memory datagram network for tests and simulation.
///
/// Behaves like lossy UDP: datagrams to unknown addresses or full inboxes
/// vanish silently.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::{mpsc, RwLock};
    use tracing::{trace, warn};

    use crate::error::ProtoError;

    const INBOX_CAPACITY: usize = 1000;

    #[derive(Debug)]
    struct Datagram {
        from: SocketAddr,
        data: Bytes,
    }

    /// Shared state for the memory transport network.
    pub struct MemoryNetwork {
        /// Inbox of each attached address.
        inboxes: RwLock<HashMap<SocketAddr, mpsc::Sender<Datagram>>>,
    }

    impl MemoryNetwork {
        /// Create a new memory network.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Attach a transport at `addr`, replacing any previous one.
        pub async fn create_transport(self: &Arc<Self>, addr: SocketAddr) -> MemoryTransport {
            let (tx, rx) = mpsc::channel(INBOX_CAPACITY);

            self.inboxes.write().await.insert(addr, tx);

            MemoryTransport {
                addr,
                network: Arc::clone(self),
                receiver: RwLock::new(rx),
            }
        }

        /// Detach `addr`. Its transport sees the network as closed.
        pub async fn disconnect(&self, addr: &SocketAddr) -> bool {
            self.inboxes.write().await.remove(addr).is_some()
        }

        /// Whether a transport is attached at `addr`.
        pub async fn is_attached(&self, addr: &SocketAddr) -> bool {
            self.inboxes.read().await.contains_key(addr)
        }
    }

    impl Default for MemoryNetwork {
        fn default() -> Self {
            Self {
                inboxes: RwLock::new(HashMap::new()),
            }
        }
    }

    /// In-memory transport implementation.
    pub struct MemoryTransport {
        addr: SocketAddr,
        network: Arc<MemoryNetwork>,
        receiver: RwLock<mpsc::Receiver<Datagram>>,
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn send(&self, to: SocketAddr, datagram: Bytes) -> Result<()> {
            if datagram.len() > MAX_DATAGRAM {
                return Err(ProtoError::Transport(format!(
                    "datagram of {} bytes exceeds {}",
                    datagram.len(),
                    MAX_DATAGRAM
                )));
            }

            let inboxes = self.network.inboxes.read().await;
            match inboxes.get(&to) {
                Some(inbox) => {
                    let datagram = Datagram {
                        from: self.addr,
                        data: datagram,
                    };
                    if let Err(e) = inbox.try_send(datagram) {
                        warn!(from = %self.addr, %to, "datagram dropped: {}", e);
                    }
                }
                None => trace!(from = %self.addr, %to, "datagram to unattached address dropped"),
            }
            Ok(())
        }

        async fn recv(&self) -> Result<(SocketAddr, Bytes)> {
            let mut rx = self.receiver.write().await;
            match rx.recv().await {
                Some(datagram) => Ok((datagram.from, datagram.data)),
                None => Err(ProtoError::Closed),
            }
        }

        async fn recv_timeout(&self, timeout: Duration) -> Result<Option<(SocketAddr, Bytes)>> {
            let mut rx = self.receiver.write().await;
            match tokio::time::timeout(timeout, rx.recv()).await {
                Ok(Some(datagram)) => Ok(Some((datagram.from, datagram.data))),
                Ok(None) => Err(ProtoError::Closed),
                Err(_) => Ok(None), // Timeout
            }
        }

        fn local_addr(&self) -> SocketAddr {
            self.addr
        }
    }
}

/// UDP socket transport.
pub mod udp {
    use super::*;
    use tokio::net::{ToSocketAddrs, UdpSocket};

    /// Transport over a bound tokio UDP socket.
    pub struct UdpTransport {
        socket: UdpSocket,
        local_addr: SocketAddr,
    }

    impl UdpTransport {
        /// Bind a socket. Use port 0 to let the OS choose.
        pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
            let socket = UdpSocket::bind(addr).await?;
            let local_addr = socket.local_addr()?;
            Ok(Self { socket, local_addr })
        }
    }

    #[async_trait]
    impl Transport for UdpTransport {
        async fn send(&self, to: SocketAddr, datagram: Bytes) -> Result<()> {
            self.socket.send_to(&datagram, to).await?;
            Ok(())
        }

        async fn recv(&self) -> Result<(SocketAddr, Bytes)> {
            let mut buf = vec![0u8; MAX_DATAGRAM + 1];
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            buf.truncate(len);
            Ok((from, Bytes::from(buf)))
        }

        async fn recv_timeout(&self, timeout: Duration) -> Result<Option<(SocketAddr, Bytes)>> {
            match tokio::time::timeout(timeout, self.recv()).await {
                Ok(received) => received.map(Some),
                Err(_) => Ok(None),
            }
        }

        fn local_addr(&self) -> SocketAddr {
            self.local_addr
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryNetwork;
    use super::udp::UdpTransport;
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn test_memory_transport_send_recv() {
        let network = MemoryNetwork::new();

        let transport_a = network.create_transport(addr(1)).await;
        let transport_b = network.create_transport(addr(2)).await;

        transport_a
            .send(addr(2), Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let (from, data) = transport_b.recv().await.unwrap();
        assert_eq!(from, addr(1));
        assert_eq!(&data[..], b"hello");
    }

    #[tokio::test]
    async fn test_memory_transport_drops_unknown_destination() {
        let network = MemoryNetwork::new();
        let transport_a = network.create_transport(addr(1)).await;

        transport_a
            .send(addr(99), Bytes::from_static(b"lost"))
            .await
            .unwrap();

        let received = transport_a
            .recv_timeout(Duration::from_millis(20))
            .await
            .unwrap();
        assert!(received.is_none());
    }

    #[tokio::test]
    async fn test_memory_transport_disconnect_closes() {
        let network = MemoryNetwork::new();
        let transport_a = network.create_transport(addr(1)).await;

        assert!(network.is_attached(&addr(1)).await);
        assert!(network.disconnect(&addr(1)).await);
        assert!(!network.is_attached(&addr(1)).await);

        assert!(matches!(
            transport_a.recv().await,
            Err(crate::ProtoError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_udp_loopback() {
        let a = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let b = UdpTransport::bind("127.0.0.1:0").await.unwrap();

        a.send(b.local_addr(), Bytes::from_static(b"datagram"))
            .await
            .unwrap();

        let (from, data) = b
            .recv_timeout(Duration::from_secs(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(from, a.local_addr());
        assert_eq!(&data[..], b"datagram");
    }
}
