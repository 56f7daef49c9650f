//! Store protocol: replicate a value to every target of its key.

use std::sync::Arc;

use bytes::Bytes;
use ringstore_core::{subop, ConsistencyLevel, KeyValue, Message, OpType, Outcome};
use ringstore_store::Storage;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::Result;
use crate::quorum::{self, Replicated, Reply};

/// A STORE/PUT of one key/value pair.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub key: Bytes,
    pub value: Bytes,
    pub level: ConsistencyLevel,
}

impl Replicated for StoreRequest {
    type Value = ();

    const OP: OpType = OpType::Store;
    const REQUEST: u8 = subop::store::PUT;

    fn key(&self) -> &Bytes {
        &self.key
    }

    fn level(&self) -> ConsistencyLevel {
        self.level
    }

    fn payload(&self) -> Result<Bytes> {
        Ok(KeyValue::new(self.key.clone(), self.value.clone()).encode()?)
    }

    fn classify(reply: &Message) -> Option<Reply<()>> {
        match reply.subop {
            subop::store::ACK => Some(Reply::Ack(())),
            _ => None,
        }
    }
}

/// Replicate `value` under `key` at `level`.
///
/// Values larger than the configured limit are refused without touching the
/// network.
pub async fn store(ctx: Arc<Context>, key: Bytes, value: Bytes, level: ConsistencyLevel) -> Outcome {
    if value.len() > ctx.config.max_value_size {
        warn!(
            len = value.len(),
            max = ctx.config.max_value_size,
            "value too large to store"
        );
        return Outcome::Error;
    }

    let request = StoreRequest { key, value, level };
    quorum::run(ctx, request).await.outcome()
}

/// Server side of STORE/PUT: write the entry and build the ACK.
pub async fn handle_put<S: Storage + ?Sized>(
    ctx: &Context,
    storage: &S,
    request: &Message,
) -> Result<Message> {
    let kv = KeyValue::decode(&request.payload)?;
    debug!(from = %request.reply_to, key_len = kv.key.len(), "store put");

    storage.put(kv.key, kv.value).await?;
    Ok(ctx.reply(request, subop::store::ACK))
}
