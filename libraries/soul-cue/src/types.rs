//! Core types for cue playback

use crate::error::{CueError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment prefix for config overrides (`SOUL_CUE_VOLUME`, ...)
const ENV_PREFIX: &str = "SOUL_CUE";

/// Configuration for a cue controller
///
/// Immutable for the lifetime of a controller. All fields are optional in
/// serialized form and fall back to [`CueConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    /// Locator of the audio resource, handed to the backend as-is
    pub source: String,

    /// Initial target volume (0.0-1.0, default: 1.0)
    pub volume: f64,

    /// Load the resource as soon as the controller is created (default: true)
    pub preload: bool,

    /// Let the host loop the clip (default: false)
    pub looping: bool,

    /// Play once on creation (default: false)
    pub autoplay: bool,

    /// Start the random scheduler on creation (default: false)
    pub play_randomly: bool,

    /// Lower bound of the random replay delay in ms (default: 5000)
    pub min_interval_ms: u64,

    /// Upper bound of the random replay delay in ms (default: 15000)
    pub max_interval_ms: u64,

    /// Crop window start in seconds (default: 0)
    pub start_from: f64,

    /// Crop window end in seconds
    pub stop_at: Option<f64>,

    /// Fade-in duration in seconds (default: 0, no fade)
    pub transition_start: f64,

    /// Fade-out duration in seconds (default: 0, no fade)
    pub transition_end: f64,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            volume: 1.0,
            preload: true,
            looping: false,
            autoplay: false,
            play_randomly: false,
            min_interval_ms: 5000,
            max_interval_ms: 15000,
            start_from: 0.0,
            stop_at: None,
            transition_start: 0.0,
            transition_end: 0.0,
        }
    }
}

impl CueConfig {
    /// Default configuration for the given source
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a file, with `SOUL_CUE_*` environment overrides
    ///
    /// The file format is picked from the extension (toml, json, yaml, ...).
    /// The result is validated before it is returned.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CueError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// Rejects anything that would otherwise produce a negative fade window,
    /// a reversed interval range or an out-of-range volume.
    pub fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() || !(0.0..=1.0).contains(&self.volume) {
            return Err(CueError::InvalidConfig(format!(
                "volume must be within 0.0-1.0, got {}",
                self.volume
            )));
        }

        check_seconds("start_from", self.start_from)?;
        check_seconds("transition_start", self.transition_start)?;
        check_seconds("transition_end", self.transition_end)?;

        if self.min_interval_ms > self.max_interval_ms {
            return Err(CueError::InvalidConfig(format!(
                "min_interval_ms ({}) exceeds max_interval_ms ({})",
                self.min_interval_ms, self.max_interval_ms
            )));
        }

        if let Some(stop_at) = self.stop_at {
            if !stop_at.is_finite() || stop_at <= self.start_from {
                return Err(CueError::InvalidConfig(format!(
                    "stop_at ({stop_at}) must be greater than start_from ({})",
                    self.start_from
                )));
            }

            let window = stop_at - self.start_from;
            if self.transition_end > window {
                return Err(CueError::InvalidConfig(format!(
                    "transition_end ({}s) does not fit the crop window ({window}s)",
                    self.transition_end
                )));
            }
        }

        Ok(())
    }

    /// Fade-in duration
    pub fn fade_in(&self) -> Duration {
        Duration::from_secs_f64(self.transition_start)
    }

    /// Fade-out duration
    pub fn fade_out(&self) -> Duration {
        Duration::from_secs_f64(self.transition_end)
    }
}

fn check_seconds(name: &str, value: f64) -> Result<()> {
    if Duration::try_from_secs_f64(value).is_ok() {
        Ok(())
    } else {
        Err(CueError::InvalidConfig(format!(
            "{name} must be a non-negative number of seconds, got {value}"
        )))
    }
}

/// Snapshot of the observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueState {
    /// A session is live
    pub is_playing: bool,

    /// Target volume (0.0-1.0)
    pub current_volume: f64,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// `stop()` was called
    Stopped,

    /// A new `play()` replaced the session
    Superseded,

    /// Reached the end of the crop window
    WindowEnd,

    /// The fade-out finished
    FadedOut,

    /// Host reported natural end of the clip
    Finished,

    /// Load error or rejected playback
    Failed,

    /// Controller was disposed
    Disposed,
}
