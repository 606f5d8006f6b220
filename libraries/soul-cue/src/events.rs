//! Cue events
//!
//! The controller records what it did so UI code can react without polling
//! every field. Drain them with `CueController::drain_events`.

use crate::fader::FadeDirection;
use crate::types::EndReason;
use serde::{Deserialize, Serialize};

/// Events emitted by a cue controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CueEvent {
    /// A new session started playing
    SessionStarted {
        /// Session sequence number (starts at 1)
        session: u64,
    },

    /// The session was torn down
    SessionEnded {
        /// Session sequence number
        session: u64,
        /// Why it ended
        reason: EndReason,
    },

    /// A fade began
    FadeStarted {
        /// Fade-in or fade-out
        direction: FadeDirection,
        /// Fade length in milliseconds
        duration_ms: u64,
    },

    /// A fade reached its target
    FadeCompleted {
        /// Fade-in or fade-out
        direction: FadeDirection,
    },

    /// Target volume changed through `adjust_volume`
    VolumeChanged {
        /// New clamped volume
        volume: f64,
    },

    /// Next random play was scheduled
    RandomPlayScheduled {
        /// Delay until the play, in milliseconds
        delay_ms: u64,
    },

    /// A load or playback failure was absorbed
    Error {
        /// Error message
        message: String,
    },
}

impl CueEvent {
    /// Check if this event reports a failure
    pub fn is_error(&self) -> bool {
        matches!(self, CueEvent::Error { .. })
    }
}
