//! EventRouter trait — one-way delivery into the event-routing layer.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::selector::candidate::KeyCode;

use super::PlatformError;

/// The message handed to the routing layer when a handler is chosen.
///
/// Serialized as MessagePack with named fields by the socket router, so
/// handlers written against any MessagePack library can decode it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedEvent {
    /// Identifier of the chosen handler.
    pub destination: String,
    /// Adjusted action code of the captured event.
    pub code: KeyCode,
    /// Opaque environment payload, passed through unmodified.
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
    /// Deliver as if the destination intercepted the original event
    /// first, ahead of any other listener.
    pub ordered: bool,
}

/// Best-effort, single-attempt delivery addressed by destination identity.
///
/// `deliver` returns a future so the caller decides where it runs; the
/// forwarding gateway spawns it and never awaits it on the controlling
/// context.
pub trait EventRouter: Send + Sync {
    fn deliver(&self, event: ForwardedEvent) -> BoxFuture<'static, Result<(), PlatformError>>;
}
