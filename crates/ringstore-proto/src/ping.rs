//! Ping protocol: check that a named peer answers.
//!
//! ```text
//! START ──> SENT ──> WAIT_PONG ──┬──> RCVD_PONG ──> SUCCESS
//!   │                            ├──> TIMEOUT
//!   └──> ERROR <─────────────────┘ (send failed)
//! ```

use std::sync::Arc;

use ringstore_core::{subop, Message, OpType, Outcome, Peer};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::context::Context;
use crate::fsa::{Automaton, Fsa, InputSender, Timeout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingState {
    Start,
    Sent,
    WaitPong,
    RcvdPong,
    Success,
    Timeout,
    Error,
}

impl PingState {
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Success => Outcome::Success,
            Self::Timeout => Outcome::Timeout,
            _ => Outcome::Error,
        }
    }
}

#[derive(Debug)]
pub enum PingInput {
    Start,
    Pong(Message),
    SendFailed,
    Settle,
    Timeout,
}

pub struct Ping {
    ctx: Arc<Context>,
    target: String,
    inputs: InputSender<PingInput>,
    request_id: u64,
    send: JoinSet<()>,
    routed: bool,
}

impl Ping {
    pub fn new(ctx: Arc<Context>, target: impl Into<String>, inputs: InputSender<PingInput>) -> Self {
        let request_id = ctx.next_request_id();
        Self {
            ctx,
            target: target.into(),
            inputs,
            request_id,
            send: JoinSet::new(),
            routed: false,
        }
    }

    fn send_ping(&mut self, peer: Arc<Peer>) {
        let message = self
            .ctx
            .request(OpType::Ping, subop::ping::PING)
            .with_request_id(self.request_id);

        let inputs = self.inputs.clone();
        self.ctx
            .router
            .register(self.request_id, move |reply| inputs.send(PingInput::Pong(reply)));
        self.routed = true;

        let ctx = Arc::clone(&self.ctx);
        let inputs = self.inputs.clone();
        self.send.spawn(async move {
            if let Err(e) = ctx.send_to(&peer, &message).await {
                warn!(peer = %peer, error = %e, "ping send failed");
                inputs.send(PingInput::SendFailed);
            }
        });
    }
}

impl Automaton for Ping {
    type State = PingState;
    type Input = PingInput;

    fn transition(&mut self, state: &PingState, input: PingInput) -> PingState {
        match (state, input) {
            (PingState::Start, PingInput::Start) => match self.ctx.membership.resolve(&self.target) {
                Some(peer) => {
                    // Queued ahead of any pong the send can provoke.
                    self.inputs.send(PingInput::Settle);
                    self.send_ping(peer);
                    PingState::Sent
                }
                None => {
                    warn!(peer = %self.target, "cannot ping unknown peer");
                    PingState::Error
                }
            },

            (PingState::Sent, PingInput::Settle) => PingState::WaitPong,

            (PingState::WaitPong, PingInput::Pong(reply)) => {
                if reply.subop == subop::ping::PONG && reply.reply_to == self.target {
                    self.inputs.send(PingInput::Settle);
                    PingState::RcvdPong
                } else {
                    debug!(from = %reply.reply_to, subop = reply.subop, "ignoring stray ping reply");
                    PingState::WaitPong
                }
            }
            (PingState::WaitPong, PingInput::SendFailed) => PingState::Error,
            (PingState::WaitPong, PingInput::Timeout) => PingState::Timeout,

            (PingState::RcvdPong, PingInput::Settle) => PingState::Success,
            (PingState::RcvdPong, PingInput::Pong(_)) => PingState::RcvdPong,

            (state, input) => {
                warn!(?state, ?input, "invalid input for state");
                PingState::Error
            }
        }
    }

    fn is_terminal(&self, state: &PingState) -> bool {
        matches!(state, PingState::Success | PingState::Timeout | PingState::Error)
    }

    fn timeout(&self, state: &PingState) -> Option<Timeout<PingInput>> {
        match state {
            PingState::WaitPong => Some(Timeout::new(self.ctx.config.ping_timeout, PingInput::Timeout)),
            _ => None,
        }
    }

    fn on_terminate(&mut self, state: &PingState) {
        self.send.abort_all();
        if self.routed {
            self.ctx.router.remove(self.request_id);
        }
        debug!(peer = %self.target, outcome = %state.outcome(), "ping finished");
    }
}

/// Ping the peer called `target`.
pub async fn ping(ctx: Arc<Context>, target: &str) -> Outcome {
    let fsa = Fsa::spawn(PingState::Start, |inputs| Ping::new(ctx, target, inputs));
    fsa.send(PingInput::Start);

    match fsa.result().await {
        Ok(state) => state.outcome(),
        Err(e) => {
            warn!(peer = %target, error = %e, "ping lost");
            Outcome::Error
        }
    }
}

/// Server side of PING/PING: answer with a pong.
pub fn handle_ping(ctx: &Context, request: &Message) -> Message {
    ctx.reply(request, subop::ping::PONG)
}
