//! Tokio-backed scheduler
//!
//! Timers are `spawn_local` tasks, so the scheduler must be used from inside
//! a `tokio::task::LocalSet` on a current-thread runtime. Cancelling aborts
//! the task.

use super::{OnceTask, RepeatingTask, Scheduler, TimerId, MIN_INTERVAL};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Default)]
struct TaskTable {
    next_id: u64,
    tasks: HashMap<TimerId, AbortHandle>,
}

impl TaskTable {
    fn allocate_id(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }
}

/// Scheduler running callbacks as local tokio tasks
#[derive(Default)]
pub struct TokioScheduler {
    table: Rc<RefCell<TaskTable>>,
}

impl TokioScheduler {
    /// Create a scheduler. Must be called inside a `LocalSet`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding timers
    pub fn pending(&self) -> usize {
        self.table.borrow().tasks.len()
    }

    fn forget(table: &Weak<RefCell<TaskTable>>, id: TimerId) {
        if let Some(table) = table.upgrade() {
            table.borrow_mut().tasks.remove(&id);
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TimerId {
        let id = self.table.borrow_mut().allocate_id();
        let deadline = Instant::now() + delay;
        let table = Rc::downgrade(&self.table);

        let handle = tokio::task::spawn_local(async move {
            time::sleep_until(deadline).await;
            Self::forget(&table, id);
            task();
        });

        self.table
            .borrow_mut()
            .tasks
            .insert(id, handle.abort_handle());
        id
    }

    fn schedule_repeating(&self, interval: Duration, mut task: RepeatingTask) -> TimerId {
        let id = self.table.borrow_mut().allocate_id();
        let period = interval.max(MIN_INTERVAL);
        let start = Instant::now() + period;

        let handle = tokio::task::spawn_local(async move {
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                task();
            }
        });

        self.table
            .borrow_mut()
            .tasks
            .insert(id, handle.abort_handle());
        id
    }

    fn cancel(&self, id: TimerId) {
        let handle = self.table.borrow_mut().tasks.remove(&id);
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.table.borrow_mut().tasks.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn once_fires_after_delay() {
        LocalSet::new()
            .run_until(async {
                let scheduler = TokioScheduler::new();
                let fired = Rc::new(Cell::new(false));

                let f = fired.clone();
                scheduler.schedule_once(Duration::from_millis(100), Box::new(move || f.set(true)));
                assert_eq!(scheduler.pending(), 1);

                time::sleep(Duration::from_millis(50)).await;
                assert!(!fired.get());

                time::sleep(Duration::from_millis(60)).await;
                assert!(fired.get());
                assert_eq!(scheduler.pending(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        LocalSet::new()
            .run_until(async {
                let scheduler = TokioScheduler::new();
                let count = Rc::new(Cell::new(0));

                let c = count.clone();
                let once = scheduler
                    .schedule_once(Duration::from_millis(100), Box::new(move || c.set(c.get() + 1)));
                let c = count.clone();
                let repeating = scheduler.schedule_repeating(
                    Duration::from_millis(10),
                    Box::new(move || c.set(c.get() + 10)),
                );

                scheduler.cancel(once);
                scheduler.cancel(repeating);
                time::sleep(Duration::from_secs(1)).await;

                assert_eq!(count.get(), 0);
                assert_eq!(scheduler.pending(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_ticks_until_cancelled() {
        LocalSet::new()
            .run_until(async {
                let scheduler = TokioScheduler::new();
                let count = Rc::new(Cell::new(0));

                let c = count.clone();
                let id = scheduler.schedule_repeating(
                    Duration::from_millis(10),
                    Box::new(move || c.set(c.get() + 1)),
                );

                time::sleep(Duration::from_millis(35)).await;
                assert_eq!(count.get(), 3);

                scheduler.cancel(id);
                time::sleep(Duration::from_millis(100)).await;
                assert_eq!(count.get(), 3);
            })
            .await;
    }
}
