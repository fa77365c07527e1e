//! Session driver — discovery, wiring, and the single-writer loop.
//!
//! [`open`] discovers candidates on the blocking pool and builds the
//! session; [`run`] then owns it and applies inbox signals one at a time
//! until it closes. The surface only ever holds a [`SessionHandle`].
//! Dropping every handle counts as tearing the surface down.
//! [`cancel_when`] ends the session from outside, e.g. on a termination
//! signal, without keeping the inbox alive.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::platform::Platform;

use super::candidate::discover;
use super::gateway::{DispatchObserver, ForwardingGateway};
use super::session::{Collaborators, Outcome, SelectionSession, SessionRequest, SessionSignal};

/// Sender side of a session's inbox, held by the surface.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionSignal>,
}

impl SessionHandle {
    pub fn new(tx: mpsc::UnboundedSender<SessionSignal>) -> Self {
        Self { tx }
    }

    /// Post a signal. Returns `false` once the session is gone.
    pub fn send(&self, signal: SessionSignal) -> bool {
        self.tx.send(signal).is_ok()
    }

    /// A handle that does not count towards keeping the surface alive.
    pub fn downgrade(&self) -> WeakSessionHandle {
        WeakSessionHandle {
            tx: self.tx.downgrade(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeakSessionHandle {
    tx: mpsc::WeakUnboundedSender<SessionSignal>,
}

impl WeakSessionHandle {
    /// Post a signal if some strong handle still exists.
    pub fn send(&self, signal: SessionSignal) -> bool {
        self.tx
            .upgrade()
            .is_some_and(|tx| tx.send(signal).is_ok())
    }
}

/// Cancel the session once `trigger` completes.
///
/// Holds only a weak handle, so surface teardown still works while this
/// is waiting.
pub async fn cancel_when<F>(handle: WeakSessionHandle, trigger: F)
where
    F: Future<Output = ()>,
{
    trigger.await;
    if handle.send(SessionSignal::Cancel) {
        tracing::info!("termination requested, cancelling session");
    }
}

/// Where discovery looks and what it leaves out.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub category: String,
    pub self_id: String,
}

/// Discover candidates and open a session over them.
///
/// Returns the session, the surface handle, and the inbox that [`run`]
/// drains.
pub async fn open(
    platform: Platform,
    discovery: Discovery,
    request: SessionRequest,
    observer: Option<Arc<dyn DispatchObserver>>,
) -> (
    SelectionSession,
    SessionHandle,
    mpsc::UnboundedReceiver<SessionSignal>,
) {
    let registry = platform.registry.clone();
    let candidates = tokio::task::spawn_blocking(move || {
        discover(registry.as_ref(), &discovery.category, &discovery.self_id)
    })
    .await
    .unwrap_or_else(|e| {
        tracing::warn!(error = %e, "discovery task failed, offering no candidates");
        Vec::new()
    });

    let mut gateway = ForwardingGateway::new(platform.router);
    if let Some(observer) = observer {
        gateway = gateway.with_observer(observer);
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let session = SelectionSession::open(
        request,
        candidates,
        Collaborators {
            attention: platform.attention,
            gateway,
            preferences: platform.preferences,
        },
        &tx,
    );

    (session, SessionHandle::new(tx), rx)
}

/// Apply inbox signals in arrival order until the session closes.
///
/// If the inbox closes first (all handles dropped), the session is
/// cancelled. A preference write started by `ignore` is awaited after
/// the session has closed.
pub async fn run(
    mut session: SelectionSession,
    mut inbox: mpsc::UnboundedReceiver<SessionSignal>,
) -> Outcome {
    loop {
        if let Some(outcome) = session.state().outcome() {
            if let Some(write) = session.take_pending_write() {
                if let Err(e) = write.await {
                    tracing::warn!(session = %session.id(), error = %e, "preference write task failed");
                }
            }
            if let Some(ticket) = session.dispatched() {
                tracing::debug!(
                    session = %session.id(),
                    ticket = %ticket.id,
                    destination = %ticket.destination,
                    "run finished after dispatch"
                );
            }
            return outcome;
        }

        match inbox.recv().await {
            Some(signal) => session.handle(signal),
            None => {
                tracing::info!(session = %session.id(), "surface torn down");
                session.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{
        AttentionResource, ComponentRegistry, PlatformError, PreferenceStore,
    };
    use crate::selector::attention::tests::{Answer, AttentionLog, FakeAttention};
    use crate::selector::candidate::tests::handler;
    use crate::selector::candidate::{CandidateHandler, CapturedEvent, KeyCode};
    use crate::selector::gateway::tests::{Delivery, RecordingRouter};
    use futures::future::BoxFuture;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    struct FixedRegistry(Result<Vec<CandidateHandler>, ()>);

    impl ComponentRegistry for FixedRegistry {
        fn query(&self, _category: &str) -> Result<Vec<CandidateHandler>, PlatformError> {
            self.0
                .clone()
                .map_err(|()| PlatformError::Registry("down".into()))
        }
    }

    struct NoPreferences;

    impl PreferenceStore for NoPreferences {
        fn is_ignoring(&self) -> Result<bool, PlatformError> {
            Ok(false)
        }

        fn ignore_future(&self) -> BoxFuture<'static, Result<(), PlatformError>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn platform(
        registry: Result<Vec<CandidateHandler>, ()>,
        router: Arc<RecordingRouter>,
    ) -> Platform {
        platform_with_log(registry, router).0
    }

    fn platform_with_log(
        registry: Result<Vec<CandidateHandler>, ()>,
        router: Arc<RecordingRouter>,
    ) -> (Platform, Arc<Mutex<AttentionLog>>) {
        let (attention, log) = FakeAttention::new(Answer::Grant);
        let attention: Box<dyn AttentionResource> = Box::new(attention);
        let platform = Platform {
            registry: Arc::new(FixedRegistry(registry)),
            attention,
            router,
            preferences: Box::new(NoPreferences),
        };
        (platform, log)
    }

    fn discovery() -> Discovery {
        Discovery {
            category: "media-button".into(),
            self_id: "mediarouter".into(),
        }
    }

    fn request(timeout_secs: u64) -> SessionRequest {
        SessionRequest {
            event: Some(CapturedEvent::new(KeyCode::Next, &b"x"[..])),
            timeout_secs,
            playing: None,
        }
    }

    #[tokio::test]
    async fn open_discovers_without_self() {
        let router = RecordingRouter::new(Delivery::Succeed);
        let registry = Ok(vec![handler("org.a"), handler("mediarouter"), handler("org.b")]);

        let (session, _handle, _inbox) =
            open(platform(registry, router), discovery(), request(0), None).await;

        let ids: Vec<_> = session.candidates().iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, ["org.a", "org.b"]);
    }

    #[tokio::test]
    async fn open_survives_discovery_failure() {
        let router = RecordingRouter::new(Delivery::Succeed);
        let (session, handle, inbox) =
            open(platform(Err(()), router), discovery(), request(0), None).await;

        assert!(session.candidates().is_empty());
        handle.send(SessionSignal::Cancel);
        assert_eq!(run(session, inbox).await, Outcome::Cancelled);
    }

    #[tokio::test]
    async fn run_forwards_selection() {
        let router = RecordingRouter::new(Delivery::Succeed);
        let registry = Ok(vec![handler("org.a"), handler("org.b"), handler("org.c")]);
        let (session, handle, inbox) =
            open(platform(registry, router.clone()), discovery(), request(5), None).await;

        handle.send(SessionSignal::Interact);
        handle.send(SessionSignal::Select(1));
        handle.send(SessionSignal::Select(2));

        assert_eq!(run(session, inbox).await, Outcome::Forwarded);
        let sent = router.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, "org.b");
    }

    #[tokio::test(start_paused = true)]
    async fn run_times_out() {
        let router = RecordingRouter::new(Delivery::Succeed);
        let (session, handle, inbox) = open(
            platform(Ok(vec![handler("org.a")]), router.clone()),
            discovery(),
            request(5),
            None,
        )
        .await;

        let outcome = run(session, inbox).await;
        assert_eq!(outcome, Outcome::TimedOut);
        assert!(router.sent().is_empty());
        assert!(!handle.send(SessionSignal::Interact), "inbox gone once the session ends");
    }

    #[tokio::test]
    async fn dropping_every_handle_cancels() {
        let router = RecordingRouter::new(Delivery::Succeed);
        let (session, handle, inbox) =
            open(platform(Ok(vec![handler("org.a")]), router), discovery(), request(5), None)
                .await;

        drop(handle);
        let outcome = tokio::time::timeout(Duration::from_secs(1), run(session, inbox))
            .await
            .expect("run returns on teardown");
        assert_eq!(outcome, Outcome::Cancelled);
    }

    #[tokio::test]
    async fn ignore_ends_the_run() {
        let router = RecordingRouter::new(Delivery::Succeed);
        let (session, handle, inbox) =
            open(platform(Ok(vec![handler("org.a")]), router), discovery(), request(0), None)
                .await;

        handle.send(SessionSignal::Ignore);
        assert_eq!(run(session, inbox).await, Outcome::Ignored);
    }

    #[tokio::test(start_paused = true)]
    async fn termination_cancels_and_releases_once() {
        let router = RecordingRouter::new(Delivery::Succeed);
        let (platform, log) = platform_with_log(Ok(vec![handler("org.a")]), router.clone());
        let (session, handle, inbox) = open(platform, discovery(), request(30), None).await;
        assert!(session.has_attention());

        let (terminate, terminated) = oneshot::channel::<()>();
        let watcher = tokio::spawn(cancel_when(handle.downgrade(), async move {
            let _ = terminated.await;
        }));

        tokio::time::sleep(Duration::from_secs(3)).await;
        terminate.send(()).unwrap();

        // The surface handle is still alive: only the termination ends the run.
        assert_eq!(run(session, inbox).await, Outcome::Cancelled);
        watcher.await.unwrap();
        assert!(router.sent().is_empty());
        assert!(!handle.send(SessionSignal::Select(0)));

        let log = log.lock().unwrap();
        assert_eq!(log.requests, 1);
        assert_eq!(log.abandons, 1);
    }

    #[tokio::test]
    async fn pending_cancel_does_not_keep_the_surface_alive() {
        let router = RecordingRouter::new(Delivery::Succeed);
        let (session, handle, inbox) =
            open(platform(Ok(vec![handler("org.a")]), router), discovery(), request(5), None)
                .await;

        let watcher = tokio::spawn(cancel_when(handle.downgrade(), std::future::pending()));
        drop(handle);

        let outcome = tokio::time::timeout(Duration::from_secs(1), run(session, inbox))
            .await
            .expect("run returns on teardown");
        assert_eq!(outcome, Outcome::Cancelled);
        watcher.abort();
    }
}
