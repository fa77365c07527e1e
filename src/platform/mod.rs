//! Platform abstraction — the environment services a selection session
//! depends on.
//!
//! Every process-wide service (component registry, attention resource,
//! event routing, durable preferences) is expressed as a trait so the
//! session logic never reaches for a global. Adapters implement one or
//! more traits; `main` composes them into a [`Platform`] at startup.

pub mod attention;
pub mod local;
pub mod preferences;
pub mod registry;
pub mod router;

use std::sync::Arc;

pub use attention::AttentionResource;
pub use preferences::PreferenceStore;
pub use registry::ComponentRegistry;
pub use router::{EventRouter, ForwardedEvent};

/// Errors returned by platform adapters.
///
/// None of these ever escape the selector layer; they are logged and
/// absorbed into a degraded but still terminating session.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Registry query failed (e.g. category directory unreadable).
    #[error("registry: {0}")]
    Registry(String),

    /// Attention request failed for a reason other than plain denial.
    #[error("attention: {0}")]
    Attention(String),

    /// The destination could not be reached or the frame not written.
    #[error("delivery: {0}")]
    Delivery(String),

    /// Durable preference read or write failed.
    #[error("preferences: {0}")]
    Preferences(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A composed set of platform adapters.
///
/// Constructed once per process and handed to the driver. The registry
/// and router are shared with background tasks (discovery runs on the
/// blocking pool, delivery on a spawned task), hence `Arc`.
pub struct Platform {
    /// Enumerates handlers registered for an event category.
    pub registry: Arc<dyn ComponentRegistry>,

    /// Process-wide exclusive attention hold.
    pub attention: Box<dyn AttentionResource>,

    /// One-way delivery into the event-routing layer.
    pub router: Arc<dyn EventRouter>,

    /// Durable "ignore future sessions" flag.
    pub preferences: Box<dyn PreferenceStore>,
}
