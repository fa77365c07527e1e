//! AttentionResource trait — the process-wide exclusive attention hold.

use super::PlatformError;

/// A single system-wide exclusive resource, analogous to audio focus.
///
/// Only the controlling context calls into it. A second `request` while
/// a hold exists replaces that hold rather than stacking a new one.
pub trait AttentionResource: Send {
    /// Request a transient hold that allows other output to keep playing
    /// at reduced volume.
    ///
    /// Returns `Ok(true)` when granted, `Ok(false)` when another holder
    /// refused to yield, `Err` when the request itself failed.
    fn request_transient(&mut self) -> Result<bool, PlatformError>;

    /// Relinquish the hold. Safe to call when nothing is held.
    fn abandon(&mut self);
}
