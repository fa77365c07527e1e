//! mediarouter — asks which registered handler should receive a captured
//! media button press, then forwards it to exactly one of them.

mod config;
mod platform;
mod selector;
mod surface;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use config::SelectorConfig;
use platform::PlatformError;
use selector::{CapturedEvent, DispatchObserver, DispatchTicket, KeyCode, Outcome, SessionRequest};

/// How long to keep the process alive for an in-flight delivery after
/// the session has closed as forwarded.
const DELIVERY_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(
    name = "mediarouter",
    version,
    about = "Choose which handler receives a media button press"
)]
struct Cli {
    #[command(flatten)]
    config: SelectorConfig,

    /// The captured key (play-pause, next, previous, stop, ...). Omit to
    /// only list the registered handlers.
    #[arg(long)]
    key: Option<KeyCode>,

    /// Opaque payload forwarded with the key, byte for byte.
    #[arg(long, default_value = "")]
    payload: String,

    /// Whether audio is playing right now; names a play/pause press as
    /// "pause" or "play" in the prompt.
    #[arg(long)]
    playing: Option<bool>,
}

/// Lets `main` wait for the single delivery to settle before exiting.
struct DeliveryNotifier(mpsc::UnboundedSender<bool>);

impl DispatchObserver for DeliveryNotifier {
    fn on_complete(&self, _ticket: &DispatchTicket, result: &Result<(), PlatformError>) {
        let _ = self.0.send(result.is_ok());
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mediarouter=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(serve(cli));
    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_background();
    code
}

async fn serve(cli: Cli) -> ExitCode {
    if let Err(e) = cli.config.ensure_dirs() {
        tracing::error!(error = %e, "bad configuration");
        return ExitCode::FAILURE;
    }

    let platform = cli.config.platform();
    match platform.preferences.is_ignoring() {
        Ok(true) => {
            tracing::info!("selection disabled by user preference");
            return ExitCode::SUCCESS;
        }
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "could not read preferences, asking anyway"),
    }

    let event = cli
        .key
        .map(|code| CapturedEvent::new(code, cli.payload.into_bytes()));
    let request = SessionRequest {
        event,
        timeout_secs: cli.config.timeout,
        playing: cli.playing,
    };

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let (session, handle, inbox) = selector::driver::open(
        platform,
        cli.config.discovery(),
        request,
        Some(Arc::new(DeliveryNotifier(done_tx))),
    )
    .await;
    tracing::debug!(
        session = %session.id(),
        attention = session.has_attention(),
        "surface ready"
    );

    print!("{}", surface::render(&session));
    let termination = tokio::spawn(selector::driver::cancel_when(
        handle.downgrade(),
        terminated(),
    ));
    let input = tokio::spawn(surface::read_commands(tokio::io::stdin(), handle));

    let outcome = selector::driver::run(session, inbox).await;
    input.abort();
    termination.abort();
    println!("{}", surface::describe(outcome));

    if outcome == Outcome::Forwarded
        && tokio::time::timeout(DELIVERY_GRACE, done_rx.recv())
            .await
            .is_err()
    {
        tracing::warn!("delivery still pending at exit");
    }

    ExitCode::SUCCESS
}

/// Resolves on SIGTERM or SIGINT. Never resolves if the handlers cannot
/// be installed.
async fn terminated() {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "failed to install signal handlers");
                return std::future::pending().await;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        _ = sigint.recv() => tracing::info!("received SIGINT"),
    }
}
