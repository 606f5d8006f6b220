//! Error types for cue playback

use thiserror::Error;

/// Cue playback errors
#[derive(Debug, Error)]
pub enum CueError {
    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Audio resource failed to load or decode
    #[error("Failed to load audio resource: {0}")]
    ResourceLoad(String),

    /// Host refused to start playback
    #[error("Playback rejected by host: {0}")]
    PlaybackRejected(String),

    /// Configuration source could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Operation requires a live session
    #[error("No active playback session")]
    NoActiveSession,
}

impl From<config::ConfigError> for CueError {
    fn from(err: config::ConfigError) -> Self {
        CueError::Config(err.to_string())
    }
}

/// Result type for cue operations
pub type Result<T> = std::result::Result<T, CueError>;
