//! Flag-file preference store.

use std::io::ErrorKind;
use std::path::PathBuf;

use futures::future::BoxFuture;

use crate::platform::{PlatformError, PreferenceStore};

/// Content of the flag file when the user has opted out.
const IGNORE_MARKER: &str = "ignore";

pub struct FlagFilePreferences {
    path: PathBuf,
}

impl FlagFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for FlagFilePreferences {
    fn is_ignoring(&self) -> Result<bool, PlatformError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.trim() == IGNORE_MARKER),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PlatformError::Preferences(format!(
                "read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn ignore_future(&self) -> BoxFuture<'static, Result<(), PlatformError>> {
        let path = self.path.clone();
        Box::pin(async move {
            tokio::fs::write(&path, IGNORE_MARKER).await.map_err(|e| {
                PlatformError::Preferences(format!("write {}: {e}", path.display()))
            })
        })
    }
}
