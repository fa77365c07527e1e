//! Selector configuration — CLI flags with environment fallbacks.
//!
//! Paths default to a per-user runtime directory
//! (`$XDG_RUNTIME_DIR/mediarouter`, else `<tmp>/mediarouter`).

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::platform::Platform;
use crate::platform::local::{FlagFilePreferences, LockFileAttention, SocketRegistry, SocketRouter};
use crate::selector::{Discovery, MEDIA_BUTTON_CATEGORY};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("runtime directory {path}: {source}")]
    RuntimeDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Args)]
pub struct SelectorConfig {
    /// Seconds of inactivity before the selection is dismissed (0 = never).
    #[arg(long, env = "MEDIAROUTER_TIMEOUT", default_value_t = 0)]
    pub timeout: u64,

    /// Registry category to offer handlers from.
    #[arg(long, default_value = MEDIA_BUTTON_CATEGORY)]
    pub category: String,

    /// Our own registry identifier; never offered as a destination.
    #[arg(long, default_value = "mediarouter")]
    pub self_id: String,

    /// Root of the handler socket registry.
    #[arg(long, env = "MEDIAROUTER_REGISTRY_DIR")]
    pub registry_dir: Option<PathBuf>,

    /// Lock file backing the attention resource.
    #[arg(long, env = "MEDIAROUTER_LOCK_FILE")]
    pub lock_file: Option<PathBuf>,

    /// Flag file recording "ignore future sessions".
    #[arg(long, env = "MEDIAROUTER_PREFS_FILE")]
    pub prefs_file: Option<PathBuf>,
}

impl SelectorConfig {
    pub fn runtime_dir() -> PathBuf {
        std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
            .join("mediarouter")
    }

    pub fn registry_dir(&self) -> PathBuf {
        self.registry_dir
            .clone()
            .unwrap_or_else(|| Self::runtime_dir().join("handlers"))
    }

    pub fn lock_file(&self) -> PathBuf {
        self.lock_file
            .clone()
            .unwrap_or_else(|| Self::runtime_dir().join("attention.lock"))
    }

    pub fn prefs_file(&self) -> PathBuf {
        self.prefs_file
            .clone()
            .unwrap_or_else(|| Self::runtime_dir().join("ignore"))
    }

    /// Create the parent directories of the lock and preference files.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        for file in [self.lock_file(), self.prefs_file()] {
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent).map_err(|source| ConfigError::RuntimeDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    pub fn discovery(&self) -> Discovery {
        Discovery {
            category: self.category.clone(),
            self_id: self.self_id.clone(),
        }
    }

    /// Compose the local-host adapters.
    pub fn platform(&self) -> Platform {
        let registry = SocketRegistry::new(self.registry_dir());
        Platform {
            registry: Arc::new(registry.clone()),
            attention: Box::new(LockFileAttention::new(self.lock_file())),
            router: Arc::new(SocketRouter::new(registry, self.category.clone())),
            preferences: Box::new(FlagFilePreferences::new(self.prefs_file())),
        }
    }
}
