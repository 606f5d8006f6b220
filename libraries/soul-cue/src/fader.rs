//! Stepped linear volume fades
//!
//! A fade is a fixed number of discrete volume writes driven by a repeating
//! timer. Each tick adds a constant delta to whatever level the handle holds
//! at that moment, so an explicit volume write mid-fade shifts the rest of
//! the ramp instead of being ignored. The final tick always lands exactly on
//! the target.

use crate::volume::clamp_volume;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of interpolation steps per fade
pub const FADE_STEPS: u32 = 50;

/// Fade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FadeDirection {
    /// Ramp towards the target volume at session start
    In,

    /// Ramp towards silence before the session ends
    Out,
}

/// What happens once a fade lands on its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeCompletion {
    /// Leave the session playing
    Continue,

    /// Pause and tear down the session
    EndSession,
}

/// Result of advancing a ramp by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeStep {
    /// Intermediate level to write
    Step(f64),

    /// Final level to write; the ramp is done
    Finished(f64),
}

/// Linear ramp state for one fade
#[derive(Debug, Clone)]
pub struct FadeRamp {
    target: f64,
    step_delta: f64,
    interval: Duration,
    ticks: u32,
}

impl FadeRamp {
    /// Plan a ramp from `from` to `target` over `duration`
    ///
    /// Returns `None` for a zero duration; the caller applies the target
    /// immediately in that case.
    pub fn new(from: f64, target: f64, duration: Duration) -> Option<Self> {
        if duration.is_zero() {
            return None;
        }

        let target = clamp_volume(target);
        let from = clamp_volume(from);

        Some(Self {
            target,
            step_delta: (target - from) / f64::from(FADE_STEPS),
            interval: duration / FADE_STEPS,
            ticks: 0,
        })
    }

    /// Timer period between steps
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Clamped target level
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Per-step volume change
    pub fn step_delta(&self) -> f64 {
        self.step_delta
    }

    /// Fraction of steps taken (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        f64::from(self.ticks) / f64::from(FADE_STEPS)
    }

    /// Advance by one tick from the level currently on the handle
    pub fn tick(&mut self, current: f64) -> FadeStep {
        self.ticks = (self.ticks + 1).min(FADE_STEPS);

        if self.ticks >= FADE_STEPS {
            FadeStep::Finished(self.target)
        } else {
            FadeStep::Step(clamp_volume(current + self.step_delta))
        }
    }

    /// Check if all steps have been taken
    pub fn is_finished(&self) -> bool {
        self.ticks >= FADE_STEPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(ramp: &mut FadeRamp, mut level: f64) -> (Vec<f64>, f64) {
        let mut steps = Vec::new();
        loop {
            match ramp.tick(level) {
                FadeStep::Step(v) => {
                    steps.push(v);
                    level = v;
                }
                FadeStep::Finished(v) => return (steps, v),
            }
        }
    }

    #[test]
    fn zero_duration_has_no_ramp() {
        assert!(FadeRamp::new(0.0, 1.0, Duration::ZERO).is_none());
    }

    #[test]
    fn ramp_takes_fixed_steps() {
        let mut ramp = FadeRamp::new(0.0, 1.0, Duration::from_secs(1)).unwrap();
        assert_eq!(ramp.interval(), Duration::from_millis(20));
        assert!((ramp.step_delta() - 0.02).abs() < 1e-12);

        let (steps, last) = run(&mut ramp, 0.0);
        assert_eq!(steps.len() as u32, FADE_STEPS - 1);
        assert_eq!(last, 1.0);
        assert!(ramp.is_finished());
        assert_eq!(ramp.progress(), 1.0);
    }

    #[test]
    fn ramp_is_linear() {
        let mut ramp = FadeRamp::new(0.0, 0.5, Duration::from_secs(2)).unwrap();
        let (steps, _) = run(&mut ramp, 0.0);

        // Level after 25 ticks is half way
        assert!((steps[24] - 0.25).abs() < 1e-9);
        for pair in steps.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn fade_out_lands_on_silence() {
        let mut ramp = FadeRamp::new(0.8, 0.0, Duration::from_millis(500)).unwrap();
        let (steps, last) = run(&mut ramp, 0.8);
        assert!(steps.iter().all(|v| (0.0..=0.8).contains(v)));
        assert_eq!(last, 0.0);
    }

    #[test]
    fn target_is_clamped() {
        let mut ramp = FadeRamp::new(0.5, 3.0, Duration::from_secs(1)).unwrap();
        assert_eq!(ramp.target(), 1.0);

        // Steps never leave 0.0-1.0 even when the handle was pushed high
        assert_eq!(ramp.tick(0.999), FadeStep::Step(1.0));
    }

    #[test]
    fn external_write_shifts_remaining_ramp() {
        let mut ramp = FadeRamp::new(0.0, 1.0, Duration::from_secs(1)).unwrap();
        ramp.tick(0.0);
        // Someone set the handle to 0.5 between ticks
        match ramp.tick(0.5) {
            FadeStep::Step(v) => assert!((v - 0.52).abs() < 1e-9),
            FadeStep::Finished(_) => panic!("ramp finished early"),
        }
    }
}
