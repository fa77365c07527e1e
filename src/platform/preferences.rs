//! PreferenceStore trait — the durable "ignore future sessions" flag.

use futures::future::BoxFuture;

use super::PlatformError;

/// Durable storage for the single opt-out flag.
///
/// The flag is read before a session is created (outside the selector)
/// and written by the session when the user chooses to ignore.
pub trait PreferenceStore: Send {
    /// Whether the user has opted out of future selection sessions.
    fn is_ignoring(&self) -> Result<bool, PlatformError>;

    /// Persist the opt-out.
    ///
    /// The returned future does the storage work and is driven off the
    /// session's context, so it must not borrow the store.
    fn ignore_future(&self) -> BoxFuture<'static, Result<(), PlatformError>>;
}
