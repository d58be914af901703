//! Confirmation gate for destructive operations.

use std::sync::{Mutex, MutexGuard, PoisonError};

use bulkfile_core::ConfirmationPrompt;
use tokio::sync::{oneshot, watch};
use tracing::debug;

/// Observable state of the gate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Idle,
    /// A prompt is open and waiting for the user.
    AwaitingConfirmation(ConfirmationPrompt),
    Confirmed,
    Dismissed,
}

impl GateState {
    /// The prompt to render, if one is open.
    pub fn prompt(&self) -> Option<&ConfirmationPrompt> {
        match self {
            Self::AwaitingConfirmation(prompt) => Some(prompt),
            _ => None,
        }
    }
}

/// The user's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Confirmed,
    Dismissed,
}

impl From<GateDecision> for GateState {
    fn from(decision: GateDecision) -> Self {
        match decision {
            GateDecision::Confirmed => Self::Confirmed,
            GateDecision::Dismissed => Self::Dismissed,
        }
    }
}

/// Yes/no gate between a destructive intent and its remote call.
///
/// `request` opens a prompt and suspends until the rendering side calls
/// [`ConfirmationGate::confirm`] or [`ConfirmationGate::dismiss`]. Only one
/// prompt is open at a time.
#[derive(Debug)]
pub struct ConfirmationGate {
    state: watch::Sender<GateState>,
    pending: Mutex<Option<oneshot::Sender<GateDecision>>>,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::Idle);
        Self {
            state,
            pending: Mutex::new(None),
        }
    }

    /// Open a prompt and wait for the answer.
    ///
    /// Resolves `Dismissed` if another prompt is already open, or if the
    /// answer can no longer arrive.
    pub async fn request(&self, prompt: ConfirmationPrompt) -> GateDecision {
        let rx = {
            let mut pending = self.pending();
            if pending.as_ref().is_some_and(|tx| !tx.is_closed()) {
                debug!(target: "bulkfile::gate", "prompt already open, dismissing new request");
                return GateDecision::Dismissed;
            }
            let (tx, rx) = oneshot::channel();
            *pending = Some(tx);
            self.state.send_replace(GateState::AwaitingConfirmation(prompt));
            rx
        };

        let decision = rx.await.unwrap_or(GateDecision::Dismissed);
        debug!(target: "bulkfile::gate", ?decision, "prompt answered");

        self.state.send_replace(decision.into());
        self.state.send_replace(GateState::Idle);
        decision
    }

    /// Accept the open prompt. Returns false if nothing was waiting.
    pub fn confirm(&self) -> bool {
        self.resolve(GateDecision::Confirmed)
    }

    /// Cancel the open prompt. Returns false if nothing was waiting.
    pub fn dismiss(&self) -> bool {
        self.resolve(GateDecision::Dismissed)
    }

    fn resolve(&self, decision: GateDecision) -> bool {
        let Some(tx) = self.pending().take() else {
            return false;
        };
        if tx.send(decision).is_err() {
            // The requester went away; nothing will reset the state for us.
            self.state.send_replace(GateState::Idle);
            return false;
        }
        true
    }

    pub fn state(&self) -> GateState {
        self.state.borrow().clone()
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(*self.state.borrow(), GateState::AwaitingConfirmation(_))
    }

    /// Observe state transitions, e.g. to show or hide a modal.
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    fn pending(&self) -> MutexGuard<'_, Option<oneshot::Sender<GateDecision>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
