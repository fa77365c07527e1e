//! SelectionSession — the state machine arbitrating one captured event.
//!
//! ```text
//! Created ─┬─ event present ─▶ AwaitingSelection ─┬─ select(i) ─▶ Closed(Forwarded)
//!          └─ no event ──────▶ PassiveDisplay ────┼─ cancel() ──▶ Closed(Cancelled)
//!                                                 ├─ ignore() ──▶ Closed(Ignored)
//!                                                 └─ timeout ───▶ Closed(TimedOut)
//! ```
//!
//! All transitions run on the single context that owns the session. The
//! watchdog only ever posts [`SessionSignal::TimeoutFired`] into the
//! session's inbox; a fire whose token is no longer current is dropped.
//! Entering a terminal outcome disarms the watchdog and releases
//! attention in the same step, so a closed session never holds either.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::platform::{AttentionResource, PreferenceStore};

use super::attention::AttentionCoordinator;
use super::candidate::{CandidateHandler, CapturedEvent};
use super::gateway::{DispatchTicket, ForwardingGateway};
use super::watchdog::{ArmToken, TimeoutWatchdog};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// A handler was chosen and the event handed off to it.
    Forwarded,
    /// Dismissed without choosing, or torn down.
    Cancelled,
    /// No interaction within the configured timeout.
    TimedOut,
    /// The user opted out of future sessions.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transient; only observable inside `open`.
    Created,
    /// Event present, selection enabled.
    AwaitingSelection,
    /// No event: handlers are listed but cannot be selected.
    PassiveDisplay,
    /// Terminal. Attention released, watchdog disarmed.
    Closed(Outcome),
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed(_))
    }

    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Self::Closed(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Messages accepted by the session's single writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// Choose the candidate at this (0-based) index.
    Select(usize),
    /// Any user interaction; resets the timeout.
    Interact,
    Cancel,
    Ignore,
    /// Posted by the watchdog from its own task.
    TimeoutFired(ArmToken),
}

/// What the environment asks for when it opens a session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    /// `None` opens the session in passive display mode.
    pub event: Option<CapturedEvent>,
    /// Inactivity timeout; `0` disables it.
    pub timeout_secs: u64,
    /// Whether audio output is currently playing, if the environment
    /// knows. Only used to name a play/pause press.
    pub playing: Option<bool>,
}

/// The collaborators a session drives.
pub struct Collaborators {
    pub attention: Box<dyn AttentionResource>,
    pub gateway: ForwardingGateway,
    pub preferences: Box<dyn PreferenceStore>,
}

pub struct SelectionSession {
    id: Uuid,
    candidates: Vec<CandidateHandler>,
    event: Option<CapturedEvent>,
    state: SessionState,
    timeout_secs: u64,
    playing: Option<bool>,
    attention: AttentionCoordinator,
    watchdog: TimeoutWatchdog,
    gateway: ForwardingGateway,
    preferences: Box<dyn PreferenceStore>,
    /// Weak so an open session alone never keeps its inbox alive: once
    /// every surface handle is gone the driver sees the channel close.
    inbox: mpsc::WeakUnboundedSender<SessionSignal>,
    dispatched: Option<DispatchTicket>,
    /// The opt-out write started by `ignore`, until someone waits for it.
    pending_write: Option<JoinHandle<()>>,
}

impl SelectionSession {
    /// Create a session over already-discovered `candidates`, acquire
    /// attention, arm the watchdog and enter the first live state.
    ///
    /// Watchdog fires are posted to `inbox`. Must be called within a
    /// tokio runtime.
    pub fn open(
        request: SessionRequest,
        candidates: Vec<CandidateHandler>,
        collaborators: Collaborators,
        inbox: &mpsc::UnboundedSender<SessionSignal>,
    ) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            candidates,
            event: request.event,
            state: SessionState::Created,
            timeout_secs: request.timeout_secs,
            playing: request.playing,
            attention: AttentionCoordinator::new(collaborators.attention),
            watchdog: TimeoutWatchdog::new(),
            gateway: collaborators.gateway,
            preferences: collaborators.preferences,
            inbox: inbox.downgrade(),
            dispatched: None,
            pending_write: None,
        };

        let granted = session.attention.acquire();
        session.arm_watchdog();
        session.state = if session.event.is_some() {
            SessionState::AwaitingSelection
        } else {
            SessionState::PassiveDisplay
        };

        tracing::info!(
            session = %session.id,
            candidates = session.candidates.len(),
            state = ?session.state,
            attention = granted,
            timeout_secs = session.timeout_secs,
            "selection session opened"
        );
        session
    }

    /// Apply one signal. Signals that do not apply in the current state
    /// are dropped.
    pub fn handle(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::Select(index) => self.select(index),
            SessionSignal::Interact => self.interact(),
            SessionSignal::Cancel => self.cancel(),
            SessionSignal::Ignore => self.ignore(),
            SessionSignal::TimeoutFired(token) => self.timeout_fired(token),
        }
    }

    /// Forward the event to `candidates[index]` and close.
    ///
    /// A no-op unless awaiting selection with `index` in range.
    pub fn select(&mut self, index: usize) {
        if self.state != SessionState::AwaitingSelection {
            tracing::debug!(session = %self.id, index, state = ?self.state, "select ignored");
            return;
        }
        let (Some(event), Some(candidate)) = (&self.event, self.candidates.get(index)) else {
            tracing::debug!(
                session = %self.id,
                index,
                candidates = self.candidates.len(),
                "select out of range"
            );
            return;
        };

        let ticket = self.gateway.dispatch(event, candidate);
        tracing::info!(
            session = %self.id,
            candidate = %candidate.id,
            ticket = %ticket.id,
            "event forwarded"
        );
        self.dispatched = Some(ticket);
        self.close(Outcome::Forwarded);
    }

    /// Reset the inactivity timeout.
    pub fn interact(&mut self) {
        if self.is_open() {
            self.arm_watchdog();
        }
    }

    pub fn cancel(&mut self) {
        if self.is_open() {
            self.close(Outcome::Cancelled);
        }
    }

    /// Close without forwarding and persist the opt-out in the background.
    ///
    /// The session is closed as ignored before the write runs. A failed
    /// write is logged.
    pub fn ignore(&mut self) {
        if !self.is_open() {
            return;
        }
        let write = self.preferences.ignore_future();
        let session = self.id;
        self.pending_write = Some(tokio::spawn(async move {
            match write.await {
                Ok(()) => tracing::debug!(%session, "ignore preference persisted"),
                Err(e) => {
                    tracing::warn!(%session, error = %e, "could not persist ignore preference")
                }
            }
        }));
        self.close(Outcome::Ignored);
    }

    /// Close as timed out, provided `token` is the armed timer's.
    pub fn timeout_fired(&mut self, token: ArmToken) {
        if !self.is_open() || !self.watchdog.is_current(token) {
            tracing::debug!(session = %self.id, ?token, "stale timeout dropped");
            return;
        }
        self.close(Outcome::TimedOut);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.state,
            SessionState::AwaitingSelection | SessionState::PassiveDisplay
        )
    }

    pub fn candidates(&self) -> &[CandidateHandler] {
        &self.candidates
    }

    pub fn event(&self) -> Option<&CapturedEvent> {
        self.event.as_ref()
    }

    /// Whether this session currently holds the attention resource.
    pub fn has_attention(&self) -> bool {
        !self.state.is_terminal() && self.attention.is_held()
    }

    /// Ticket of the single dispatch, once forwarded.
    pub fn dispatched(&self) -> Option<&DispatchTicket> {
        self.dispatched.as_ref()
    }

    /// Hand over the in-flight opt-out write, if `ignore` started one.
    pub fn take_pending_write(&mut self) -> Option<JoinHandle<()>> {
        self.pending_write.take()
    }

    /// Header line for the surface.
    pub fn prompt(&self) -> String {
        match &self.event {
            Some(event) => format!(
                "Select handler for {}",
                event.code.action_label(self.playing)
            ),
            None => "Registered media button handlers".to_string(),
        }
    }

    fn arm_watchdog(&mut self) {
        let inbox = self.inbox.clone();
        self.watchdog.arm(self.timeout_secs, move |token| {
            if let Some(inbox) = inbox.upgrade() {
                let _ = inbox.send(SessionSignal::TimeoutFired(token));
            }
        });
    }

    fn close(&mut self, outcome: Outcome) {
        self.watchdog.disarm();
        self.attention.release();
        self.state = SessionState::Closed(outcome);
        tracing::info!(session = %self.id, ?outcome, "selection session closed");
    }
}

impl Drop for SelectionSession {
    /// Tearing down an open session cancels it synchronously.
    fn drop(&mut self) {
        self.cancel();
    }
}
