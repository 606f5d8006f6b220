//! Linear volume level
//!
//! Cue volume is a plain linear gain in 0.0-1.0, matching what host audio
//! elements accept. Every write goes through [`clamp_volume`].

/// Clamp a requested volume into 0.0-1.0
///
/// NaN maps to silence.
pub fn clamp_volume(level: f64) -> f64 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// Target volume shared by the facade, the fader and session start
///
/// Last write wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    level: f64,
}

impl Volume {
    /// Create a volume, clamped to 0.0-1.0
    pub fn new(level: f64) -> Self {
        Self {
            level: clamp_volume(level),
        }
    }

    /// Set the level, returning the clamped value actually stored
    pub fn set_level(&mut self, level: f64) -> f64 {
        self.level = clamp_volume(level);
        self.level
    }

    /// Current level (0.0-1.0)
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Check if silent
    pub fn is_silent(&self) -> bool {
        self.level == 0.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}
