//! Load protocol: read a value from every target of its key.

use std::sync::Arc;

use bytes::Bytes;
use ringstore_core::{subop, ConsistencyLevel, KeyValue, Message, OpType};
use ringstore_store::Storage;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::Result;
use crate::quorum::{self, QuorumState, Replicated, Reply};

/// A LOAD/GET of one key.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub key: Bytes,
    pub level: ConsistencyLevel,
}

impl Replicated for LoadRequest {
    type Value = Bytes;

    const OP: OpType = OpType::Load;
    const REQUEST: u8 = subop::load::GET;

    fn key(&self) -> &Bytes {
        &self.key
    }

    fn level(&self) -> ConsistencyLevel {
        self.level
    }

    fn payload(&self) -> Result<Bytes> {
        Ok(KeyValue::key_only(self.key.clone()).encode()?)
    }

    fn classify(reply: &Message) -> Option<Reply<Bytes>> {
        match reply.subop {
            subop::load::ACK => match KeyValue::decode(&reply.payload) {
                Ok(kv) => Some(Reply::Ack(kv.value)),
                Err(e) => {
                    warn!(from = %reply.reply_to, error = %e, "undecodable load ack");
                    None
                }
            },
            subop::load::NACK => Some(Reply::Nack),
            _ => None,
        }
    }
}

/// Read `key` from its replicas at `level`.
///
/// Returns the terminal state so the caller can see both the value and how
/// many replicas agreed.
pub async fn load(ctx: Arc<Context>, key: Bytes, level: ConsistencyLevel) -> QuorumState<Bytes> {
    quorum::run(ctx, LoadRequest { key, level }).await
}

/// Server side of LOAD/GET: ACK with the entry or NACK if absent.
pub async fn handle_get<S: Storage + ?Sized>(
    ctx: &Context,
    storage: &S,
    request: &Message,
) -> Result<Message> {
    let kv = KeyValue::decode(&request.payload)?;

    match storage.get(&kv.key).await? {
        Some(value) => {
            debug!(from = %request.reply_to, key_len = kv.key.len(), "load hit");
            let payload = KeyValue::new(kv.key, value).encode()?;
            Ok(ctx.reply(request, subop::load::ACK).with_payload(payload))
        }
        None => {
            debug!(from = %request.reply_to, key_len = kv.key.len(), "load miss");
            Ok(ctx.reply(request, subop::load::NACK))
        }
    }
}
