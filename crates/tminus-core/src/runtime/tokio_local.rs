use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{instant_after, MIN_PERIOD};
use crate::system::{Clock, IntervalFn, TimeoutFn, TimerId, Timers};

type TaskMap = Rc<RefCell<HashMap<TimerId, JoinHandle<()>>>>;

fn instant_deadline(after: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(after).unwrap_or(now + Duration::from_secs(86_400 * 365 * 30))
}

/// Wall time measured on tokio's clock: the wall instant at creation plus
/// the tokio time elapsed since.
///
/// Immune to wall-clock jumps, and follows paused or advanced time in
/// `tokio::time` tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin_wall: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin_wall: Utc::now(),
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        instant_after(self.origin_wall, self.origin.elapsed())
    }
}

/// Timers backed by tokio local tasks.
///
/// Every timer is a `spawn_local` task, so all methods must be called from
/// inside a [`tokio::task::LocalSet`]. Callbacks are `!Send` and run on the
/// set's thread, one at a time. Dropping the value aborts every timer.
pub struct TokioTimers {
    clock: TokioClock,
    next_id: Cell<TimerId>,
    tasks: TaskMap,
}

impl TokioTimers {
    pub fn new() -> Self {
        Self {
            clock: TokioClock::new(),
            next_id: Cell::new(0),
            tasks: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// The clock these timers fire against.
    pub fn clock(&self) -> TokioClock {
        self.clock
    }

    fn issue_id(&self) -> TimerId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

impl Default for TokioTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioTimers {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl Timers for TokioTimers {
    fn set_timeout(&self, delay: Duration, callback: TimeoutFn) -> TimerId {
        let id = self.issue_id();
        let tasks = Rc::clone(&self.tasks);
        // The task cannot run before we yield, so the insert below always
        // lands before the task's own remove.
        let deadline = instant_deadline(delay);
        let handle = tokio::task::spawn_local(async move {
            time::sleep_until(deadline).await;
            tasks.borrow_mut().remove(&id);
            callback();
        });
        self.tasks.borrow_mut().insert(id, handle);
        id
    }

    fn set_interval(&self, period: Duration, mut callback: IntervalFn) -> TimerId {
        let id = self.issue_id();
        let period = period.max(MIN_PERIOD);
        let tasks = Rc::clone(&self.tasks);
        let first = instant_deadline(period);
        let handle = tokio::task::spawn_local(async move {
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if callback().is_break() {
                    break;
                }
            }
            tasks.borrow_mut().remove(&id);
        });
        self.tasks.borrow_mut().insert(id, handle);
        id
    }

    fn clear(&self, id: TimerId) {
        // Clearing an interval from its own callback aborts the running task;
        // the abort lands at its next await.
        let handle = self.tasks.borrow_mut().remove(&id);
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    fn is_active(&self, id: TimerId) -> bool {
        self.tasks.borrow().contains_key(&id)
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.borrow_mut().drain() {
            handle.abort();
        }
    }
}
