//! A cluster member: listener, client and storage on one transport.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use ringstore_core::{ConsistencyLevel, Peer};
use ringstore_proto::{Client, Context, Dispatcher, Membership, Transport};
use ringstore_store::Storage;
use tokio::task::JoinHandle;
use tracing::info;

use crate::blob::Blob;
use crate::config::NodeConfig;
use crate::error::{BlobError, Result};

/// A running node.
///
/// Serves Store, Load and Ping requests from its peers on a background
/// listener task and offers the client API for its own requests.
pub struct Node<S: Storage + 'static> {
    config: NodeConfig,
    client: Client,
    storage: Arc<S>,
    listener: Option<JoinHandle<()>>,
}

impl<S: Storage + 'static> Node<S> {
    /// Validate `config` and start listening on `transport`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: NodeConfig,
        membership: Arc<Membership>,
        transport: Arc<dyn Transport>,
        storage: Arc<S>,
    ) -> Result<Self> {
        config.validate()?;

        let ctx = Context::new(
            config.name.clone(),
            config.protocol.clone(),
            membership,
            transport,
        );
        let dispatcher = Dispatcher::new(Arc::clone(&ctx), Arc::clone(&storage));
        let listener = tokio::spawn(async move { dispatcher.run().await });

        info!(
            node = %config.name,
            addr = %ctx.transport.local_addr(),
            partitions = config.partitions,
            "node started"
        );

        Ok(Self {
            config,
            client: Client::new(ctx),
            storage,
            listener: Some(listener),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The client API for requests originating at this node.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Local storage backing this node's replicas.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn membership(&self) -> &Arc<Membership> {
        &self.client.context().membership
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.client.context().transport.local_addr()
    }

    /// How this node should appear in peer sets.
    pub fn as_peer(&self) -> Peer {
        Peer::new(self.config.name.clone(), self.local_addr()).with_partitions(self.config.partitions)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Blob Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a blob of `size` bytes with the configured page size.
    pub async fn create_blob(
        &self,
        key: impl Into<Bytes>,
        size: u64,
        level: ConsistencyLevel,
    ) -> std::result::Result<Blob, BlobError> {
        Blob::create(self.client.clone(), key, size, self.config.blob.page_size, level).await
    }

    /// Open an existing blob.
    pub async fn open_blob(
        &self,
        key: impl Into<Bytes>,
        level: ConsistencyLevel,
    ) -> std::result::Result<Blob, BlobError> {
        Blob::open(self.client.clone(), key, self.config.blob.page_size, level).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Stop the listener and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            let _ = listener.await;
        }
        info!(node = %self.config.name, "node stopped");
    }
}

impl<S: Storage + 'static> Drop for Node<S> {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
