//! Text surface — renders the candidate list and turns input lines into
//! session signals.
//!
//! Lines: `<n>` or `select <n>` picks the n-th listed handler (1-based),
//! `cancel` dismisses, `ignore` opts out of future sessions. Anything
//! else counts as user interaction and only resets the timeout.

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec};

use crate::selector::{Outcome, SelectionSession, SessionHandle, SessionSignal};

/// Longest accepted input line. Commands are a few bytes; anything longer
/// is not a command.
pub const MAX_COMMAND_LEN: usize = 256;

/// Map one input line to a signal.
pub fn parse_command(line: &str) -> SessionSignal {
    let line = line.trim().to_ascii_lowercase();
    let number = line.strip_prefix("select").unwrap_or(line.as_str()).trim();

    if let Ok(n) = number.parse::<usize>() {
        // 0 is not a listed position; treat it like any other keypress.
        return match n.checked_sub(1) {
            Some(index) => SessionSignal::Select(index),
            None => SessionSignal::Interact,
        };
    }

    match line.as_str() {
        "cancel" | "c" | "q" => SessionSignal::Cancel,
        "ignore" => SessionSignal::Ignore,
        _ => SessionSignal::Interact,
    }
}

/// Prompt and numbered candidate list.
pub fn render(session: &SelectionSession) -> String {
    let mut out = session.prompt();
    out.push('\n');

    if session.candidates().is_empty() {
        out.push_str("  (no handlers registered)\n");
    }
    for (i, candidate) in session.candidates().iter().enumerate() {
        out.push_str(&format!("  {}) {} [{}]\n", i + 1, candidate.label, candidate.id));
    }

    if session.event().is_some() {
        out.push_str("number to choose, `cancel`, or `ignore` to stop asking\n");
    } else {
        out.push_str("`cancel` to close, or `ignore` to stop asking\n");
    }
    out
}

pub fn describe(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Forwarded => "forwarded",
        Outcome::Cancelled => "cancelled",
        Outcome::TimedOut => "timed out",
        Outcome::Ignored => "ignored; future presses will not ask",
    }
}

/// Feed lines from `input` to the session until input ends, the input
/// fails, or the session goes away. The handle is dropped on return.
///
/// A line over [`MAX_COMMAND_LEN`] counts as an input failure.
pub async fn read_commands<R>(input: R, handle: SessionHandle)
where
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(input, LinesCodec::new_with_max_length(MAX_COMMAND_LEN));

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "surface input failed");
                break;
            }
        };
        if !handle.send(parse_command(&line)) {
            break;
        }
    }
}
