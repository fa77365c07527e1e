//! AttentionCoordinator — idempotent acquire/release over the platform's
//! attention resource.

use crate::platform::AttentionResource;

/// Wraps an [`AttentionResource`] so a session acquires at most once and
/// releases at most once, whatever order the calls arrive in.
pub struct AttentionCoordinator {
    resource: Box<dyn AttentionResource>,
    /// `None` until the first `acquire`; afterwards the grant outcome,
    /// kept until `release`.
    grant: Option<bool>,
}

impl AttentionCoordinator {
    pub fn new(resource: Box<dyn AttentionResource>) -> Self {
        Self {
            resource,
            grant: None,
        }
    }

    /// Request the transient hold on first call; later calls return the
    /// cached outcome without asking again.
    ///
    /// Denial and request failure both yield `false`: the session carries
    /// on without ducking other output.
    pub fn acquire(&mut self) -> bool {
        if let Some(granted) = self.grant {
            return granted;
        }

        let granted = match self.resource.request_transient() {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!(error = %e, "attention request failed, continuing without it");
                false
            }
        };
        if !granted {
            tracing::debug!("attention denied");
        }

        self.grant = Some(granted);
        granted
    }

    /// Relinquish the hold if an acquire was attempted. Idempotent.
    pub fn release(&mut self) {
        if self.grant.take().is_some() {
            self.resource.abandon();
        }
    }

    /// Whether the resource is currently held.
    pub fn is_held(&self) -> bool {
        self.grant == Some(true)
    }
}

impl Drop for AttentionCoordinator {
    fn drop(&mut self) {
        self.release();
    }
}
