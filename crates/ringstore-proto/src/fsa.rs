//! Minimal finite-state-automaton runtime.
//!
//! Every asynchronous protocol exchange is an [`Automaton`] driven by one
//! tokio task. Inputs are queued on an unbounded channel and processed in
//! order; each state may arm a deadline that feeds a timeout input back
//! through the transition function. The final state is published exactly
//! once.
//!
//! ```text
//!   InputSender ──┐
//!   InputSender ──┼──> [ queue ] ──> transition ──> state ──> terminal? ──> result
//!   deadline ─────┘
//! ```

use std::fmt;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{ProtoError, Result};

/// A deadline attached to a state.
#[derive(Debug)]
pub struct Timeout<I> {
    /// Time allowed in the state, measured from when it was entered.
    pub after: Duration,
    /// Input fed to the automaton when the deadline passes.
    pub input: I,
}

impl<I> Timeout<I> {
    pub fn new(after: Duration, input: I) -> Self {
        Self { after, input }
    }
}

/// A protocol expressed as states and inputs.
pub trait Automaton: Send + 'static {
    type State: Clone + PartialEq + fmt::Debug + Send + 'static;
    type Input: fmt::Debug + Send + 'static;

    /// Compute the next state. Returning the current state leaves any armed
    /// deadline untouched.
    fn transition(&mut self, state: &Self::State, input: Self::Input) -> Self::State;

    /// Whether `state` ends the automaton.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Deadline for `state`, armed when the state is entered.
    fn timeout(&self, _state: &Self::State) -> Option<Timeout<Self::Input>> {
        None
    }

    /// Called once with the final state before it is published.
    fn on_terminate(&mut self, _state: &Self::State) {}
}

enum Command<I> {
    Input(I),
    Terminate,
}

/// Cloneable handle for feeding inputs to a running automaton.
pub struct InputSender<I> {
    tx: mpsc::UnboundedSender<Command<I>>,
}

impl<I> Clone for InputSender<I> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<I: fmt::Debug> InputSender<I> {
    /// Queue an input. Never blocks; inputs sent after termination are dropped.
    pub fn send(&self, input: I) {
        if let Err(mpsc::error::SendError(Command::Input(input))) =
            self.tx.send(Command::Input(input))
        {
            trace!(?input, "input discarded after termination");
        }
    }

    /// Whether the automaton has finished.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<I> fmt::Debug for InputSender<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Handle to a spawned automaton.
pub struct Fsa<A: Automaton> {
    inputs: InputSender<A::Input>,
    result: oneshot::Receiver<A::State>,
}

impl<A: Automaton> Fsa<A> {
    /// Spawn an automaton in `initial` state on its own task.
    ///
    /// `build` receives an input sender so the automaton can feed itself
    /// (self-transitions, completions of work it spawns).
    pub fn spawn<F>(initial: A::State, build: F) -> Self
    where
        F: FnOnce(InputSender<A::Input>) -> A,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = oneshot::channel();
        let inputs = InputSender { tx };

        let automaton = build(inputs.clone());
        tokio::spawn(run(automaton, initial, rx, result_tx));

        Self {
            inputs,
            result: result_rx,
        }
    }

    pub fn sender(&self) -> InputSender<A::Input> {
        self.inputs.clone()
    }

    pub fn send(&self, input: A::Input) {
        self.inputs.send(input);
    }

    /// Ask the automaton to stop and publish its current state.
    pub fn terminate(&self) {
        let _ = self.inputs.tx.send(Command::Terminate);
    }

    /// Wait for the final state.
    ///
    /// Consumes the handle, dropping its input sender: if nothing else can
    /// feed the automaton and no deadline is pending, it publishes the state
    /// it is in.
    pub async fn result(self) -> Result<A::State> {
        let Self { inputs, result } = self;
        drop(inputs);
        result.await.map_err(|_| ProtoError::Aborted)
    }
}

async fn run<A: Automaton>(
    mut automaton: A,
    mut state: A::State,
    mut rx: mpsc::UnboundedReceiver<Command<A::Input>>,
    result: oneshot::Sender<A::State>,
) {
    let arm = |t: Timeout<A::Input>| (Instant::now() + t.after, t.input);
    let mut deadline = automaton.timeout(&state).map(arm);
    let mut open = true;

    while !automaton.is_terminal(&state) {
        let at = deadline
            .as_ref()
            .map(|(at, _)| *at)
            .unwrap_or_else(Instant::now);

        let input = tokio::select! {
            biased;

            cmd = rx.recv(), if open => match cmd {
                Some(Command::Input(input)) => input,
                Some(Command::Terminate) => {
                    debug!(?state, "terminated externally");
                    break;
                }
                None => {
                    open = false;
                    if deadline.is_none() {
                        debug!(?state, "all input senders dropped");
                        break;
                    }
                    continue;
                }
            },

            _ = tokio::time::sleep_until(at), if deadline.is_some() => {
                match deadline.take() {
                    Some((_, input)) => input,
                    None => continue,
                }
            }

            else => {
                debug!(?state, "no inputs and no deadline left");
                break;
            }
        };

        trace!(?state, ?input, "transition");
        let next = automaton.transition(&state, input);
        if next != state {
            deadline = automaton.timeout(&next).map(arm);
            state = next;
        }
    }

    // Close the queue before publishing so senders observe termination.
    drop(rx);
    automaton.on_terminate(&state);
    let _ = result.send(state);
}
