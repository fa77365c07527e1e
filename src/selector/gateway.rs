//! ForwardingGateway — single-attempt, fire-and-forget dispatch of the
//! captured event to the chosen handler.
//!
//! Forwarding counts as done the moment the delivery is handed off. The
//! delivery future runs on its own task; its result only reaches an
//! attached [`DispatchObserver`] (and the log). There is no retry.

use std::sync::Arc;

use uuid::Uuid;

use crate::platform::{EventRouter, ForwardedEvent, PlatformError};

use super::candidate::{CandidateHandler, CapturedEvent};

/// Receipt for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTicket {
    pub id: Uuid,
    pub destination: String,
}

/// Observes delivery completion. Called from the delivery task, never
/// from the session's context.
pub trait DispatchObserver: Send + Sync {
    fn on_complete(&self, ticket: &DispatchTicket, result: &Result<(), PlatformError>);
}

pub struct ForwardingGateway {
    router: Arc<dyn EventRouter>,
    observer: Option<Arc<dyn DispatchObserver>>,
}

impl ForwardingGateway {
    pub fn new(router: Arc<dyn EventRouter>) -> Self {
        Self {
            router,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Hand `event` off to `candidate` and return immediately.
    ///
    /// The adjusted action code is forwarded with the payload untouched,
    /// tagged `ordered` so the destination sees it before any other
    /// listener. Must be called within a tokio runtime.
    pub fn dispatch(&self, event: &CapturedEvent, candidate: &CandidateHandler) -> DispatchTicket {
        let ticket = DispatchTicket {
            id: Uuid::new_v4(),
            destination: candidate.id.clone(),
        };

        let delivery = self.router.deliver(ForwardedEvent {
            destination: candidate.id.clone(),
            code: event.code.adjusted(),
            payload: event.payload.to_vec(),
            ordered: true,
        });

        let observer = self.observer.clone();
        let receipt = ticket.clone();
        tokio::spawn(async move {
            let result = delivery.await;
            match &result {
                Ok(()) => tracing::debug!(
                    ticket = %receipt.id,
                    destination = %receipt.destination,
                    "forwarded event delivered"
                ),
                Err(e) => tracing::warn!(
                    ticket = %receipt.id,
                    destination = %receipt.destination,
                    error = %e,
                    "forwarded event not delivered"
                ),
            }
            if let Some(observer) = observer {
                observer.on_complete(&receipt, &result);
            }
        });

        ticket
    }
}
