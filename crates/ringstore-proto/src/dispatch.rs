//! Server-side handling of incoming datagrams.
//!
//! Requests are answered from local storage; replies are handed to the
//! router for the protocol instance that is waiting for them. Bad input is
//! logged and dropped, never fatal.

use std::net::SocketAddr;
use std::sync::Arc;

use ringstore_core::{subop, Message, OpType};
use ringstore_store::Storage;
use tracing::{debug, info, trace, warn};

use crate::context::Context;
use crate::error::{ProtoError, Result};
use crate::{load, ping, store};

/// Routes decoded messages to handlers or waiting protocol instances.
pub struct Dispatcher<S: Storage + ?Sized> {
    ctx: Arc<Context>,
    storage: Arc<S>,
}

impl<S: Storage + ?Sized> Dispatcher<S> {
    pub fn new(ctx: Arc<Context>, storage: Arc<S>) -> Self {
        Self { ctx, storage }
    }

    /// Receive and handle datagrams until the transport closes.
    pub async fn run(&self) {
        info!(node = %self.ctx.name, addr = %self.ctx.transport.local_addr(), "listener started");

        loop {
            match self.ctx.transport.recv().await {
                Ok((from, data)) => self.handle_datagram(from, &data).await,
                Err(ProtoError::Closed) => break,
                Err(e) => warn!(error = %e, "receive failed"),
            }
        }

        info!(node = %self.ctx.name, "listener stopped");
    }

    /// Handle one raw datagram.
    pub async fn handle_datagram(&self, from: SocketAddr, data: &[u8]) {
        let message = match Message::decode(data) {
            Ok(message) => message,
            Err(e) => {
                warn!(%from, error = %e, "dropping undecodable datagram");
                return;
            }
        };

        if message.version != self.ctx.config.protocol_version {
            warn!(
                %from,
                version = message.version,
                expected = self.ctx.config.protocol_version,
                "dropping datagram with foreign protocol version"
            );
            return;
        }

        if let Err(e) = self.handle(message).await {
            warn!(%from, error = %e, "dropping request");
        }
    }

    async fn handle(&self, message: Message) -> Result<()> {
        let reply = match (message.op, message.subop) {
            (OpType::Noop, _) => {
                trace!(from = %message.reply_to, "noop");
                return Ok(());
            }

            (OpType::Ping, subop::ping::PING) => ping::handle_ping(&self.ctx, &message),
            (OpType::Store, subop::store::PUT) => {
                store::handle_put(&self.ctx, self.storage.as_ref(), &message).await?
            }
            (OpType::Load, subop::load::GET) => {
                load::handle_get(&self.ctx, self.storage.as_ref(), &message).await?
            }

            (OpType::Ping, subop::ping::PONG)
            | (OpType::Store, subop::store::ACK)
            | (OpType::Load, subop::load::ACK | subop::load::NACK) => {
                let (op, from) = (message.op, message.reply_to.clone());
                if !self.ctx.router.deliver(message) {
                    debug!(%op, %from, "reply for finished request");
                }
                return Ok(());
            }

            (op, sub) => {
                warn!(%op, subop = sub, from = %message.reply_to, "unknown sub-operation");
                return Ok(());
            }
        };

        self.respond(&message.reply_to, &reply).await
    }

    /// Send `reply` to the peer named `to`.
    async fn respond(&self, to: &str, reply: &Message) -> Result<()> {
        let peer = self
            .ctx
            .membership
            .resolve(to)
            .ok_or_else(|| ProtoError::UnknownPeer(to.to_string()))?;
        self.ctx.send_to(&peer, reply).await
    }
}
