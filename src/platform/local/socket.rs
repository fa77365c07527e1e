//! Socket-directory registry and router.
//!
//! A handler registers for a category by binding a Unix socket at
//! `<root>/<category>/[<priority>@]<identifier>.sock`. Discovery lists
//! that directory; delivery connects to the socket and writes exactly one
//! length-delimited MessagePack frame.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use bytes::Bytes;
use futures::SinkExt;
use futures::future::BoxFuture;
use regex::Regex;
use tokio::net::UnixStream;
use tokio_util::codec::{FramedWrite, LengthDelimitedCodec};

use crate::platform::{ComponentRegistry, EventRouter, ForwardedEvent, PlatformError};
use crate::selector::candidate::CandidateHandler;

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<priority>-?\d{1,9})@)?(?P<id>[A-Za-z0-9][A-Za-z0-9._-]*)\.sock$")
        .expect("entry pattern is valid")
});

/// Parse a registry directory entry name into `(priority, identifier)`.
///
/// Returns `None` for anything that is not a handler socket name.
pub fn parse_entry(name: &str) -> Option<(i32, String)> {
    let caps = ENTRY_RE.captures(name)?;
    let priority = match caps.name("priority") {
        Some(p) => p.as_str().parse().ok()?,
        None => 0,
    };
    Some((priority, caps["id"].to_string()))
}

/// Human-readable label for an identifier: its last dot-separated segment.
fn label_for(id: &str) -> String {
    id.rsplit('.').next().unwrap_or(id).to_string()
}

#[derive(Debug)]
struct Entry {
    priority: i32,
    id: String,
    path: PathBuf,
}

/// Lists handler sockets under a registry root.
#[derive(Debug, Clone)]
pub struct SocketRegistry {
    root: PathBuf,
}

impl SocketRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// All handler entries for `category`, highest priority first, ties
    /// broken by identifier.
    fn entries(&self, category: &str) -> Result<Vec<Entry>, PlatformError> {
        let dir = self.root.join(category);
        let listing = std::fs::read_dir(&dir)
            .map_err(|e| PlatformError::Registry(format!("{}: {e}", dir.display())))?;

        let mut entries = Vec::new();
        for dirent in listing {
            let dirent = dirent?;
            let name = dirent.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some((priority, id)) = parse_entry(name) else {
                tracing::debug!(entry = name, "skipping non-handler registry entry");
                continue;
            };
            entries.push(Entry {
                priority,
                id,
                path: dirent.path(),
            });
        }

        entries.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    /// Socket path of the handler `id` registered under `category`.
    pub fn endpoint(&self, category: &str, id: &str) -> Result<Option<PathBuf>, PlatformError> {
        Ok(self
            .entries(category)?
            .into_iter()
            .find(|e| e.id == id)
            .map(|e| e.path))
    }
}

impl ComponentRegistry for SocketRegistry {
    fn query(&self, category: &str) -> Result<Vec<CandidateHandler>, PlatformError> {
        Ok(self
            .entries(category)?
            .into_iter()
            .map(|e| CandidateHandler {
                label: label_for(&e.id),
                id: e.id,
                icon: None,
            })
            .collect())
    }
}

/// Delivers forwarded events to handler sockets of one category.
#[derive(Debug, Clone)]
pub struct SocketRouter {
    registry: SocketRegistry,
    category: String,
}

impl SocketRouter {
    pub fn new(registry: SocketRegistry, category: impl Into<String>) -> Self {
        Self {
            registry,
            category: category.into(),
        }
    }
}

impl EventRouter for SocketRouter {
    fn deliver(&self, event: ForwardedEvent) -> BoxFuture<'static, Result<(), PlatformError>> {
        let registry = self.registry.clone();
        let category = self.category.clone();

        Box::pin(async move {
            let destination = event.destination.clone();
            let endpoint =
                tokio::task::spawn_blocking(move || registry.endpoint(&category, &destination))
                    .await
                    .map_err(|e| PlatformError::Delivery(format!("endpoint lookup: {e}")))??;

            let path = endpoint.ok_or_else(|| {
                PlatformError::Delivery(format!("no endpoint for {}", event.destination))
            })?;

            send_frame(&path, &event).await
        })
    }
}

/// Connect to `path` and write `event` as a single length-delimited frame.
pub async fn send_frame(path: &Path, event: &ForwardedEvent) -> Result<(), PlatformError> {
    let frame = rmp_serde::to_vec_named(event)
        .map_err(|e| PlatformError::Delivery(format!("encode: {e}")))?;

    let stream = UnixStream::connect(path)
        .await
        .map_err(|e| PlatformError::Delivery(format!("connect {}: {e}", path.display())))?;

    let mut framed = FramedWrite::new(stream, LengthDelimitedCodec::new());
    framed
        .send(Bytes::from(frame))
        .await
        .map_err(|e| PlatformError::Delivery(format!("write: {e}")))?;
    SinkExt::<Bytes>::close(&mut framed)
        .await
        .map_err(|e| PlatformError::Delivery(format!("close: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::candidate::KeyCode;
    use futures::StreamExt;
    use tokio::net::UnixListener;
    use tokio_util::codec::FramedRead;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn parse_entry_with_and_without_priority() {
        assert_eq!(
            parse_entry("100@org.example.player.sock"),
            Some((100, "org.example.player".into()))
        );
        assert_eq!(parse_entry("-5@late.sock"), Some((-5, "late".into())));
        assert_eq!(parse_entry("plain.sock"), Some((0, "plain".into())));
    }

    #[test]
    fn parse_entry_rejects_other_files() {
        assert_eq!(parse_entry("notes.txt"), None);
        assert_eq!(parse_entry(".hidden.sock"), None);
        assert_eq!(parse_entry("abc@player.sock"), None);
        assert_eq!(parse_entry("10@.sock"), None);
    }

    #[test]
    fn query_orders_by_priority_then_id() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("media-button");
        std::fs::create_dir(&dir).unwrap();
        touch(&dir, "b.player.sock");
        touch(&dir, "a.player.sock");
        touch(&dir, "50@org.radio.sock");
        touch(&dir, "-1@org.last.sock");
        touch(&dir, "README");

        let registry = SocketRegistry::new(root.path());
        let found = registry.query("media-button").unwrap();
        let ids: Vec<_> = found.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["org.radio", "a.player", "b.player", "org.last"]);
        assert_eq!(found[0].label, "radio");
        assert!(found[0].icon.is_none());
    }

    #[test]
    fn query_missing_category_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let registry = SocketRegistry::new(root.path());
        let result = registry.query("nope");
        assert!(matches!(result, Err(PlatformError::Registry(_))));
    }

    #[tokio::test]
    async fn deliver_writes_one_frame() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("media-button");
        std::fs::create_dir(&dir).unwrap();
        let listener = UnixListener::bind(dir.join("10@org.player.sock")).unwrap();

        let router = SocketRouter::new(SocketRegistry::new(root.path()), "media-button");
        let event = ForwardedEvent {
            destination: "org.player".into(),
            code: KeyCode::Next,
            payload: b"extra".to_vec(),
            ordered: true,
        };

        let accept = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut frames = FramedRead::new(stream, LengthDelimitedCodec::new());
            let frame = frames.next().await.unwrap().unwrap();
            let decoded: ForwardedEvent = rmp_serde::from_slice(&frame).unwrap();
            assert!(frames.next().await.is_none(), "exactly one frame");
            decoded
        });

        router.deliver(event.clone()).await.unwrap();
        assert_eq!(accept.await.unwrap(), event);
    }

    #[tokio::test]
    async fn deliver_to_unregistered_destination_fails() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("media-button")).unwrap();

        let router = SocketRouter::new(SocketRegistry::new(root.path()), "media-button");
        let result = router
            .deliver(ForwardedEvent {
                destination: "org.gone".into(),
                code: KeyCode::Stop,
                payload: Vec::new(),
                ordered: true,
            })
            .await;
        assert!(matches!(result, Err(PlatformError::Delivery(_))));
    }

    #[tokio::test]
    async fn deliver_to_dead_socket_fails() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("media-button");
        std::fs::create_dir(&dir).unwrap();
        // A plain file with a handler name: registered, but nobody listening.
        touch(&dir, "org.stale.sock");

        let router = SocketRouter::new(SocketRegistry::new(root.path()), "media-button");
        let result = router
            .deliver(ForwardedEvent {
                destination: "org.stale".into(),
                code: KeyCode::PlayPause,
                payload: Vec::new(),
                ordered: true,
            })
            .await;
        assert!(matches!(result, Err(PlatformError::Delivery(_))));
    }
}
