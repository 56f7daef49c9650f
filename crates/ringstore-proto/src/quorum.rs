//! Replicated request aggregation shared by Store and Load.
//!
//! A [`Quorum`] sends one request to every replica responsible for a key and
//! folds their replies into a single result:
//!
//! ```text
//! START ──> SEND ──> WAIT_ACK ──┬──> FULL_ACK ────> SUCCESS
//!             │                 ├──> PARTIAL_ACK ─> PARTIAL_SUCCESS
//!             │                 └──> NO_ACK ──────> FAILURE
//!             └──> ERROR
//! ```
//!
//! Targets are fixed when the request is sent. A target is exhausted once it
//! replied or its send failed locally. The wait ends when every target is
//! exhausted or the ack timeout fires; acks decide the outcome from there.
//! A protocol supplies only request encoding and reply classification
//! through [`Replicated`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use ringstore_core::{ConsistencyLevel, Message, OpType, Outcome, Ring, RingHash};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::Result;
use crate::fsa::{Automaton, Fsa, InputSender, Timeout};

/// How a reply counts toward the quorum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<V> {
    Ack(V),
    Nack,
}

/// A request that is replicated to every target of its key.
pub trait Replicated: Send + 'static {
    /// What an acknowledgement carries back.
    type Value: Clone + PartialEq + fmt::Debug + Send + 'static;

    const OP: OpType;
    /// Sub-operation of the outgoing request.
    const REQUEST: u8;

    fn key(&self) -> &Bytes;

    fn level(&self) -> ConsistencyLevel;

    /// Request payload, sent unchanged to every target.
    fn payload(&self) -> Result<Bytes>;

    /// Classify a reply. `None` marks a reply this protocol does not expect.
    fn classify(reply: &Message) -> Option<Reply<Self::Value>>;
}

/// States of a replicated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuorumState<V> {
    Start,
    Send,
    WaitAck,
    FullAck,
    PartialAck,
    NoAck,
    Success(V),
    PartialSuccess(V),
    /// No target acknowledged. `nacks` counts explicit NACKs; the rest of
    /// the targets stayed silent, failed to send or sent something else.
    Failure { nacks: usize, targets: usize },
    Error,
}

impl<V> QuorumState<V> {
    /// Client-visible outcome. Non-terminal states count as errors.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Success(_) => Outcome::Success,
            Self::PartialSuccess(_) => Outcome::PartialSuccess,
            Self::Failure { .. } => Outcome::Failure,
            _ => Outcome::Error,
        }
    }

    /// Whether every target explicitly answered that it holds nothing.
    pub fn all_nacked(&self) -> bool {
        matches!(self, Self::Failure { nacks, targets } if nacks == targets)
    }

    /// The acknowledged value, if any.
    pub fn into_value(self) -> Option<V> {
        match self {
            Self::Success(v) | Self::PartialSuccess(v) => Some(v),
            _ => None,
        }
    }
}

/// Inputs of a replicated request.
#[derive(Debug)]
pub enum QuorumInput {
    Start,
    Send,
    Reply(Message),
    SendFailed { peer: String },
    /// Leave a transient state.
    Settle,
    Timeout,
}

/// The automaton behind Store and Load.
pub struct Quorum<P: Replicated> {
    ctx: Arc<Context>,
    request: P,
    inputs: InputSender<QuorumInput>,
    request_id: u64,
    targets: usize,
    pending: HashSet<String>,
    acks: usize,
    nacks: usize,
    stray: usize,
    failed: usize,
    value: Option<P::Value>,
    sends: JoinSet<()>,
    routed: bool,
}

impl<P: Replicated> Quorum<P> {
    pub fn new(ctx: Arc<Context>, request: P, inputs: InputSender<QuorumInput>) -> Self {
        let request_id = ctx.next_request_id();
        Self {
            ctx,
            request,
            inputs,
            request_id,
            targets: 0,
            pending: HashSet::new(),
            acks: 0,
            nacks: 0,
            stray: 0,
            failed: 0,
            value: None,
            sends: JoinSet::new(),
            routed: false,
        }
    }

    /// Pick targets, register for replies and spawn one send per target.
    fn fan_out(&mut self) -> Result<()> {
        let peers = self.ctx.membership.snapshot();
        let ring = Ring::build(&peers)?;
        let level = self.ctx.adjusted_level(self.request.level(), peers.len());
        let targets = ring.hash_nodes(RingHash::of(self.request.key()), level.copies(peers.len()))?;

        let datagram = self
            .ctx
            .request(P::OP, P::REQUEST)
            .with_request_id(self.request_id)
            .with_payload(self.request.payload()?)
            .encode()?;

        let inputs = self.inputs.clone();
        self.ctx
            .router
            .register(self.request_id, move |reply| inputs.send(QuorumInput::Reply(reply)));
        self.routed = true;

        self.targets = targets.len();
        debug!(
            op = %P::OP,
            request_id = self.request_id,
            targets = self.targets,
            level = %level,
            "sending replicated request"
        );

        for peer in targets {
            self.pending.insert(peer.name.clone());

            let ctx = Arc::clone(&self.ctx);
            let inputs = self.inputs.clone();
            let datagram = datagram.clone();
            self.sends.spawn(async move {
                if let Err(e) = ctx.transport.send(peer.addr, datagram).await {
                    warn!(peer = %peer, error = %e, "send failed");
                    inputs.send(QuorumInput::SendFailed {
                        peer: peer.name.clone(),
                    });
                }
            });
        }

        Ok(())
    }

    /// Stay in WAIT_ACK until every target is exhausted.
    fn await_rest(&mut self) -> QuorumState<P::Value> {
        if self.pending.is_empty() {
            self.conclude()
        } else {
            QuorumState::WaitAck
        }
    }

    /// Classify the acks gathered so far into a transient state.
    fn conclude(&mut self) -> QuorumState<P::Value> {
        if self.failed == self.targets {
            return QuorumState::Error;
        }

        let next = if self.acks == self.targets {
            QuorumState::FullAck
        } else if self.acks > 0 {
            QuorumState::PartialAck
        } else {
            QuorumState::NoAck
        };

        self.inputs.send(QuorumInput::Settle);
        next
    }

    fn settle_with(&self, wrap: fn(P::Value) -> QuorumState<P::Value>) -> QuorumState<P::Value> {
        match self.value.clone() {
            Some(value) => wrap(value),
            None => QuorumState::Error,
        }
    }
}

impl<P: Replicated> Automaton for Quorum<P> {
    type State = QuorumState<P::Value>;
    type Input = QuorumInput;

    fn transition(&mut self, state: &Self::State, input: QuorumInput) -> Self::State {
        use QuorumInput as I;
        use QuorumState as S;

        match (state, input) {
            (S::Start, I::Start) => {
                self.inputs.send(I::Send);
                S::Send
            }

            (S::Send, I::Send) => match self.fan_out() {
                Ok(()) => S::WaitAck,
                Err(e) => {
                    warn!(op = %P::OP, error = %e, "replicated request failed locally");
                    S::Error
                }
            },

            (S::WaitAck, I::Reply(reply)) => {
                if !self.pending.remove(&reply.reply_to) {
                    debug!(from = %reply.reply_to, "ignoring reply from non-pending peer");
                    return S::WaitAck;
                }
                match P::classify(&reply) {
                    Some(Reply::Ack(value)) => {
                        debug!(from = %reply.reply_to, "ack");
                        self.acks += 1;
                        if self.value.is_none() {
                            self.value = Some(value);
                        }
                    }
                    Some(Reply::Nack) => {
                        debug!(from = %reply.reply_to, "nack");
                        self.nacks += 1;
                    }
                    None => {
                        warn!(
                            from = %reply.reply_to,
                            subop = reply.subop,
                            "unexpected reply counted as non-ack"
                        );
                        self.stray += 1;
                    }
                }
                self.await_rest()
            }

            (S::WaitAck, I::SendFailed { peer }) => {
                if self.pending.remove(&peer) {
                    self.failed += 1;
                }
                self.await_rest()
            }

            (S::WaitAck, I::Timeout) => {
                debug!(pending = self.pending.len(), "ack timeout");
                self.conclude()
            }

            (S::FullAck, I::Settle) => self.settle_with(S::Success),
            (S::PartialAck, I::Settle) => self.settle_with(S::PartialSuccess),
            (S::NoAck, I::Settle) => S::Failure {
                nacks: self.nacks,
                targets: self.targets,
            },

            // Late deliveries while settling.
            (
                S::FullAck | S::PartialAck | S::NoAck,
                I::Reply(_) | I::SendFailed { .. } | I::Timeout,
            ) => state.clone(),

            (state, input) => {
                warn!(?state, ?input, "invalid input for state");
                S::Error
            }
        }
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        matches!(
            state,
            QuorumState::Success(_)
                | QuorumState::PartialSuccess(_)
                | QuorumState::Failure { .. }
                | QuorumState::Error
        )
    }

    fn timeout(&self, state: &Self::State) -> Option<Timeout<QuorumInput>> {
        match state {
            QuorumState::WaitAck => Some(Timeout::new(self.ctx.config.ack_timeout, QuorumInput::Timeout)),
            _ => None,
        }
    }

    fn on_terminate(&mut self, state: &Self::State) {
        self.sends.abort_all();
        if self.routed {
            self.ctx.router.remove(self.request_id);
        }
        debug!(
            op = %P::OP,
            request_id = self.request_id,
            outcome = %state.outcome(),
            acks = self.acks,
            nacks = self.nacks,
            stray = self.stray,
            failed = self.failed,
            "replicated request finished"
        );
    }
}

/// Run one replicated request to completion.
pub async fn run<P: Replicated>(ctx: Arc<Context>, request: P) -> QuorumState<P::Value> {
    let fsa = Fsa::spawn(QuorumState::Start, |inputs| Quorum::new(ctx, request, inputs));
    fsa.send(QuorumInput::Start);

    match fsa.result().await {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "replicated request lost");
            QuorumState::Error
        }
    }
}
