//! Crop/fade window evaluation
//!
//! Decides, for each position update from the host, whether the session
//! should keep going, begin its fade-out, or stop right away. Pure and
//! idempotent: the caller passes in whether a fade-out is already running,
//! so repeated ticks after a decision do nothing.

use crate::types::CueConfig;
use std::time::Duration;

/// Decision for one position update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowAction {
    /// Keep playing
    Continue,

    /// Start fading out over the given duration
    BeginFadeOut(Duration),

    /// Pause and tear down now
    Stop,
}

/// Crop window with its fade-out lead
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropWindow {
    stop_at: Option<f64>,
    fade_out: f64,
}

impl CropWindow {
    /// Build from a validated configuration
    pub fn from_config(config: &CueConfig) -> Self {
        Self {
            stop_at: config.stop_at,
            fade_out: config.transition_end,
        }
    }

    /// Position (seconds) where the fade-out begins, if any
    pub fn fade_out_start(&self) -> Option<f64> {
        match self.stop_at {
            Some(stop_at) if self.fade_out > 0.0 => Some(stop_at - self.fade_out),
            _ => None,
        }
    }

    /// Evaluate a position update
    ///
    /// Reaching `stop_at` while a fade-out runs never stops abruptly; the
    /// fade's own completion ends the session.
    /// A running fade-in does not hold back the fade-out; the caller replaces it.
    pub fn evaluate(&self, position: f64, fade_out_running: bool) -> WindowAction {
        let Some(stop_at) = self.stop_at else {
            return WindowAction::Continue;
        };

        if fade_out_running {
            return WindowAction::Continue;
        }

        if position >= stop_at {
            return WindowAction::Stop;
        }

        match self.fade_out_start() {
            Some(start) if position >= start => {
                WindowAction::BeginFadeOut(Duration::from_secs_f64(self.fade_out))
            }
            _ => WindowAction::Continue,
        }
    }
}
