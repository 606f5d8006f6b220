//! Virtual-time scheduler
//!
//! Time only moves when the owner calls [`ManualScheduler::advance`]. Due
//! callbacks fire in deadline order (ties in scheduling order), each with the
//! clock set to its own deadline.
//!
//! A timer scheduled from inside `advance` with no delay waits for the next
//! `advance`, so a task that keeps rescheduling itself at zero delay cannot
//! stall the caller.

use super::{OnceTask, RepeatingTask, Scheduler, TimerId, MIN_INTERVAL};
use std::cell::RefCell;
use std::time::Duration;

enum TaskKind {
    Once(OnceTask),
    Repeating {
        interval: Duration,
        task: RepeatingTask,
    },
}

struct Entry {
    id: TimerId,
    deadline: Duration,
    /// Clock reading when the entry was pushed
    scheduled_at: Duration,
    seq: u64,
    kind: TaskKind,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    entries: Vec<Entry>,
    /// Timer whose task is executing right now
    running: Option<TimerId>,
    /// Set when the running timer cancels itself
    running_cancelled: bool,
}

impl ManualState {
    fn push(&mut self, id: TimerId, deadline: Duration, kind: TaskKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            id,
            deadline,
            scheduled_at: self.now,
            seq,
            kind,
        });
    }

    fn allocate_id(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }

    /// Remove the earliest entry due at or before `limit`
    ///
    /// Entries pushed at or after `barrier` (during the current advance)
    /// only qualify once their deadline is later than the moment they were
    /// scheduled.
    fn pop_due(&mut self, limit: Duration, barrier: u64) -> Option<Entry> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= limit)
            .filter(|(_, e)| e.seq < barrier || e.deadline > e.scheduled_at)
            .min_by_key(|(_, e)| (e.deadline, e.seq))
            .map(|(i, _)| i)?;
        Some(self.entries.swap_remove(index))
    }
}

/// Deterministic scheduler driven by explicit time advancement
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<ManualState>,
}

impl ManualScheduler {
    /// Create a scheduler with its clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since creation
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of outstanding timers
    pub fn pending(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Check whether a timer is still outstanding
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.state.borrow().entries.iter().any(|e| e.id == id)
    }

    /// Deadline of the earliest outstanding timer
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.borrow().entries.iter().map(|e| e.deadline).min()
    }

    /// Move the clock forward, firing every callback that falls due
    ///
    /// Returns the number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let (target, barrier) = {
            let state = self.state.borrow();
            (state.now + by, state.next_seq)
        };
        let mut fired = 0;

        loop {
            let entry = {
                let mut state = self.state.borrow_mut();
                let Some(entry) = state.pop_due(target, barrier) else {
                    break;
                };
                // Deferred zero-delay entries may be overdue; the clock never rewinds
                state.now = state.now.max(entry.deadline);
                state.running = Some(entry.id);
                state.running_cancelled = false;
                entry
            };

            fired += 1;
            match entry.kind {
                TaskKind::Once(task) => task(),
                TaskKind::Repeating { interval, mut task } => {
                    task();
                    let mut state = self.state.borrow_mut();
                    if !state.running_cancelled {
                        let deadline = entry.deadline + interval;
                        state.push(entry.id, deadline, TaskKind::Repeating { interval, task });
                    }
                }
            }

            let mut state = self.state.borrow_mut();
            state.running = None;
            state.running_cancelled = false;
        }

        self.state.borrow_mut().now = target;
        fired
    }

    /// Advance straight to the next deadline and fire what is due there
    pub fn advance_to_next(&self) -> usize {
        match self.next_deadline() {
            Some(deadline) => self.advance(deadline.saturating_sub(self.now())),
            None => 0,
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = state.allocate_id();
        let deadline = state.now + delay;
        state.push(id, deadline, TaskKind::Once(task));
        id
    }

    fn schedule_repeating(&self, interval: Duration, task: RepeatingTask) -> TimerId {
        let interval = interval.max(MIN_INTERVAL);
        let mut state = self.state.borrow_mut();
        let id = state.allocate_id();
        let deadline = state.now + interval;
        state.push(id, deadline, TaskKind::Repeating { interval, task });
        id
    }

    fn cancel(&self, id: TimerId) {
        let mut state = self.state.borrow_mut();
        if state.running == Some(id) {
            state.running_cancelled = true;
        }
        state.entries.retain(|e| e.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn once_fires_at_deadline() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(Cell::new(0));

        let f = fired.clone();
        scheduler.schedule_once(Duration::from_millis(100), Box::new(move || f.set(f.get() + 1)));

        assert_eq!(scheduler.advance(Duration::from_millis(99)), 0);
        assert_eq!(fired.get(), 0);
        assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);
        assert_eq!(fired.get(), 1);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.now(), Duration::from_millis(100));
    }

    #[test]
    fn repeating_fires_every_interval() {
        let scheduler = ManualScheduler::new();
        let count = Rc::new(Cell::new(0));

        let c = count.clone();
        let id = scheduler.schedule_repeating(
            Duration::from_millis(10),
            Box::new(move || c.set(c.get() + 1)),
        );

        scheduler.advance(Duration::from_millis(55));
        assert_eq!(count.get(), 5);
        assert!(scheduler.is_scheduled(id));

        scheduler.cancel(id);
        scheduler.advance(Duration::from_secs(1));
        assert_eq!(count.get(), 5);
    }

    #[test]
    fn repeating_task_can_cancel_itself() {
        let scheduler = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(None));

        let (c, s, own) = (count.clone(), scheduler.clone(), own_id.clone());
        let id = scheduler.schedule_repeating(
            Duration::from_millis(10),
            Box::new(move || {
                c.set(c.get() + 1);
                if c.get() == 3 {
                    if let Some(id) = own.get() {
                        s.cancel(id);
                    }
                }
            }),
        );
        own_id.set(Some(id));

        scheduler.advance(Duration::from_millis(100));
        assert_eq!(count.get(), 3);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn tasks_can_schedule_more_work() {
        let scheduler = Rc::new(ManualScheduler::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let (s, l) = (scheduler.clone(), log.clone());
        scheduler.schedule_once(
            Duration::from_millis(10),
            Box::new(move || {
                l.borrow_mut().push(s.now());
                let l2 = l.clone();
                let s2 = s.clone();
                s.schedule_once(
                    Duration::from_millis(10),
                    Box::new(move || l2.borrow_mut().push(s2.now())),
                );
            }),
        );

        scheduler.advance(Duration::from_millis(25));
        assert_eq!(
            *log.borrow(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let scheduler = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for n in 0..3 {
            let l = log.clone();
            scheduler.schedule_once(Duration::from_millis(5), Box::new(move || l.borrow_mut().push(n)));
        }

        scheduler.advance_to_next();
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn zero_delay_reschedule_waits_for_next_advance() {
        let scheduler = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));

        fn arm(scheduler: &Rc<ManualScheduler>, count: &Rc<Cell<u32>>) {
            let (s, c) = (scheduler.clone(), count.clone());
            scheduler.schedule_once(
                Duration::ZERO,
                Box::new(move || {
                    c.set(c.get() + 1);
                    arm(&s, &c);
                }),
            );
        }
        arm(&scheduler, &count);

        assert_eq!(scheduler.advance(Duration::from_millis(16)), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.advance(Duration::ZERO), 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn cancel_unknown_id_is_ignored() {
        let scheduler = ManualScheduler::new();
        scheduler.cancel(TimerId::from_raw(42));
        assert_eq!(scheduler.pending(), 0);
    }
}
