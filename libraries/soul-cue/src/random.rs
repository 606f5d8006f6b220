//! Random replay schedule
//!
//! Replays are chained single-shot timers: each firing plays and then arms
//! the next delay. There is never more than one pending timer, and a slow
//! `play()` can't make two replays overlap.

use crate::timer::{Scheduler, TimerId};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;

pub(crate) struct RandomSchedule {
    rng: StdRng,
    min_ms: u64,
    max_ms: u64,
    pending: Option<TimerId>,
    /// Bumped on every arm so a late firing of a replaced timer is ignored
    generation: u64,
}

impl RandomSchedule {
    pub fn new(rng: StdRng, min_ms: u64, max_ms: u64) -> Self {
        debug_assert!(min_ms <= max_ms);
        Self {
            rng,
            min_ms,
            max_ms,
            pending: None,
            generation: 0,
        }
    }

    /// Uniform delay in `[min_ms, max_ms]`
    pub fn next_delay(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.min_ms..=self.max_ms))
    }

    /// Generation the next armed timer must carry
    pub fn next_generation(&self) -> u64 {
        self.generation + 1
    }

    /// Record a freshly scheduled timer
    pub fn arm(&mut self, timer: TimerId, generation: u64) {
        debug_assert!(self.pending.is_none(), "random timer armed twice");
        self.pending = Some(timer);
        self.generation = generation;
    }

    /// Accept a firing, clearing the pending slot
    ///
    /// Returns false for a timer that was cancelled or replaced.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.pending.is_some() && self.generation == generation {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Cancel the pending timer, if any
    pub fn cancel(&mut self, scheduler: &dyn Scheduler) {
        if let Some(timer) = self.pending.take() {
            scheduler.cancel(timer);
        }
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }
}
