//! ComponentRegistry trait — enumerates handlers registered for an event
//! category.

use crate::selector::candidate::CandidateHandler;

use super::PlatformError;

/// Queries the environment for handlers able to receive an event category.
///
/// The registry is authoritative and never cached by callers: each
/// session asks again. Implementations return handlers in the registry's
/// natural priority order; callers preserve it.
pub trait ComponentRegistry: Send + Sync {
    /// Return every handler registered for `category`, highest priority
    /// first. May block on I/O, so callers run it off the controlling
    /// context.
    fn query(&self, category: &str) -> Result<Vec<CandidateHandler>, PlatformError>;
}
