//! Candidates and the captured event — plus discovery.
//!
//! Discovery asks the component registry for every handler of the event
//! category and drops our own entry: the router must never offer itself
//! as a destination.

use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::platform::ComponentRegistry;

/// Registry category for media-button handlers.
pub const MEDIA_BUTTON_CATEGORY: &str = "media-button";

/// One eligible destination for the captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateHandler {
    /// Stable identifier used to address the handler.
    pub id: String,
    /// Human-readable name shown on the surface.
    pub label: String,
    /// Icon reference, opaque to the selector.
    pub icon: Option<String>,
}

/// Semantic action of a media button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    PlayPause,
    Play,
    Pause,
    Next,
    Previous,
    Stop,
    /// Single-button headset hook; acts as play/pause.
    HeadsetHook,
    AudioTrack,
    Music,
}

impl KeyCode {
    /// The code actually forwarded: headset hook presses become play/pause.
    pub fn adjusted(self) -> Self {
        match self {
            Self::HeadsetHook => Self::PlayPause,
            other => other,
        }
    }

    /// Short label for the selection prompt.
    ///
    /// A play/pause press is named by what it will do when the caller
    /// knows whether output is playing; otherwise it stays ambiguous.
    pub fn action_label(self, playing: Option<bool>) -> &'static str {
        match self.adjusted() {
            Self::PlayPause | Self::HeadsetHook => match playing {
                Some(true) => "pause",
                Some(false) => "play",
                None => "play/pause",
            },
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Stop => "stop",
            Self::AudioTrack => "audio track",
            Self::Music => "music",
        }
    }
}

/// Key code string that matches no known action.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown key code: {0}")]
pub struct UnknownKeyCode(pub String);

impl FromStr for KeyCode {
    type Err = UnknownKeyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "play_pause" => Ok(Self::PlayPause),
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "next" => Ok(Self::Next),
            "previous" | "prev" => Ok(Self::Previous),
            "stop" => Ok(Self::Stop),
            "headset_hook" | "hook" => Ok(Self::HeadsetHook),
            "audio_track" => Ok(Self::AudioTrack),
            "music" => Ok(Self::Music),
            _ => Err(UnknownKeyCode(s.to_string())),
        }
    }
}

/// The input event being arbitrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub code: KeyCode,
    /// Environment metadata needed to reconstruct forwarding. Never
    /// inspected or modified.
    pub payload: Bytes,
}

impl CapturedEvent {
    pub fn new(code: KeyCode, payload: impl Into<Bytes>) -> Self {
        Self {
            code,
            payload: payload.into(),
        }
    }
}

/// Enumerate the handlers eligible for `category`, excluding `self_id`.
///
/// Registry order is preserved. A failed query degrades to an empty list
/// so the caller still opens a (trivially cancellable) session.
pub fn discover(
    registry: &dyn ComponentRegistry,
    category: &str,
    self_id: &str,
) -> Vec<CandidateHandler> {
    let mut candidates = match registry.query(category) {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::warn!(category, error = %e, "handler discovery failed, offering no candidates");
            return Vec::new();
        }
    };

    candidates.retain(|c| c.id != self_id);
    candidates
}
