//! TimeoutWatchdog — a resettable single-shot timer.
//!
//! At most one timer is armed at a time. Each arm gets a fresh
//! [`ArmToken`]; the fire callback receives it so the session can discard
//! a fire that was superseded while already in flight. The callback runs
//! on a spawned tokio task, never on the session's context: callers pass
//! something that posts a message, not something that mutates state.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Identifies one arming of the watchdog. Strictly increasing per
/// watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArmToken(u64);

struct Armed {
    token: ArmToken,
    task: JoinHandle<()>,
}

#[derive(Default)]
pub struct TimeoutWatchdog {
    last: u64,
    armed: Option<Armed>,
}

impl TimeoutWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any armed timer and schedule `on_fire` after
    /// `duration_secs`.
    ///
    /// `duration_secs == 0` disables the watchdog: nothing is scheduled
    /// and `None` is returned. Must be called within a tokio runtime.
    pub fn arm<F>(&mut self, duration_secs: u64, on_fire: F) -> Option<ArmToken>
    where
        F: FnOnce(ArmToken) + Send + 'static,
    {
        if duration_secs == 0 {
            return None;
        }

        self.disarm();

        self.last += 1;
        let token = ArmToken(self.last);
        let duration = Duration::from_secs(duration_secs);
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            on_fire(token);
        });

        tracing::trace!(token = token.0, duration_secs, "watchdog armed");
        self.armed = Some(Armed { token, task });
        Some(token)
    }

    /// Cancel the armed timer, if any. Idempotent.
    pub fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.task.abort();
            tracing::trace!(token = armed.token.0, "watchdog disarmed");
        }
    }

    /// Token of the currently armed timer.
    pub fn current(&self) -> Option<ArmToken> {
        self.armed.as_ref().map(|a| a.token)
    }

    /// Whether `token` belongs to the timer that is armed right now.
    pub fn is_current(&self, token: ArmToken) -> bool {
        self.current() == Some(token)
    }
}

impl Drop for TimeoutWatchdog {
    fn drop(&mut self) {
        self.disarm();
    }
}
