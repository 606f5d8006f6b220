//! Timer primitives
//!
//! The controller never blocks; every wait is a callback scheduled through a
//! [`Scheduler`]. Two implementations ship with the crate:
//! - [`ManualScheduler`]: virtual time, advanced explicitly by the host
//!   (frame loops, tests)
//! - `TokioScheduler`: local tasks on a current-thread tokio runtime
//!   (`tokio` feature)

mod manual;
#[cfg(feature = "tokio")]
mod tokio_local;

pub use manual::ManualScheduler;
#[cfg(feature = "tokio")]
pub use tokio_local::TokioScheduler;

use std::time::Duration;

/// Handle for a scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Wrap a raw id (for custom schedulers)
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Single-shot callback
pub type OnceTask = Box<dyn FnOnce()>;

/// Repeating callback
pub type RepeatingTask = Box<dyn FnMut()>;

/// Single-threaded timer service
///
/// Implementations must not hold internal borrows while running a task:
/// tasks routinely schedule and cancel other timers, including their own.
/// A task never runs from inside `schedule_*` or `cancel`, even with a zero
/// delay.
pub trait Scheduler {
    /// Run `task` once after `delay`
    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TimerId;

    /// Run `task` every `interval`, first run one interval from now
    fn schedule_repeating(&self, interval: Duration, task: RepeatingTask) -> TimerId;

    /// Cancel a timer. Unknown or already fired ids are ignored.
    fn cancel(&self, id: TimerId);
}

/// Smallest period a repeating timer is allowed to use
pub(crate) const MIN_INTERVAL: Duration = Duration::from_nanos(1);
