//! Lock-file attention resource.
//!
//! The hold is an exclusive, non-blocking `flock` on a well-known file.
//! A competing holder makes the request come back denied rather than
//! blocking the controlling context.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};

use crate::platform::{AttentionResource, PlatformError};

pub struct LockFileAttention {
    path: PathBuf,
    held: Option<Flock<File>>,
}

impl LockFileAttention {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            held: None,
        }
    }
}

impl AttentionResource for LockFileAttention {
    fn request_transient(&mut self) -> Result<bool, PlatformError> {
        // A new request replaces the existing hold; with flock that is
        // the same lock.
        if self.held.is_some() {
            return Ok(true);
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                self.held = Some(lock);
                Ok(true)
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Ok(false),
            Err((_, errno)) => Err(PlatformError::Attention(format!(
                "flock {}: {errno}",
                self.path.display()
            ))),
        }
    }

    fn abandon(&mut self) {
        if let Some(lock) = self.held.take() {
            if let Err((_, errno)) = lock.unlock() {
                tracing::debug!(path = %self.path.display(), error = %errno, "unlock failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_holder_is_denied_until_first_abandons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attention.lock");

        let mut first = LockFileAttention::new(&path);
        let mut second = LockFileAttention::new(&path);

        assert!(first.request_transient().unwrap());
        assert!(!second.request_transient().unwrap());

        first.abandon();
        assert!(second.request_transient().unwrap());
        second.abandon();
    }

    #[test]
    fn repeated_request_does_not_stack() {
        let dir = tempfile::tempdir().unwrap();
        let mut attention = LockFileAttention::new(dir.path().join("attention.lock"));

        assert!(attention.request_transient().unwrap());
        assert!(attention.request_transient().unwrap());

        // One abandon fully releases.
        attention.abandon();
        let mut other = LockFileAttention::new(dir.path().join("attention.lock"));
        assert!(other.request_transient().unwrap());
    }

    #[test]
    fn abandon_without_hold_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let mut attention = LockFileAttention::new(dir.path().join("attention.lock"));
        attention.abandon();
        attention.abandon();
    }

    #[test]
    fn unopenable_lock_path_is_an_error() {
        let mut attention = LockFileAttention::new("/nonexistent/dir/attention.lock");
        assert!(attention.request_transient().is_err());
    }
}
