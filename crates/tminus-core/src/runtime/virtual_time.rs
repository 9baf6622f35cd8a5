use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{instant_after, MIN_PERIOD};
use crate::system::{Clock, IntervalFn, TimeoutFn, TimerId, Timers};

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a clone can be handed to a component
/// while the test keeps another to inspect or move time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(instant_after(self.now.get(), by));
    }

    /// Move to `at`. Moving backwards is allowed; timers already due stay due.
    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

enum Callback {
    Timeout(TimeoutFn),
    Interval(IntervalFn),
}

struct Entry {
    due: DateTime<Utc>,
    /// Scheduling order, breaks ties between timers due at the same instant.
    seq: u64,
    period: Duration,
    /// `None` while the callback is running.
    callback: Option<Callback>,
}

#[derive(Default)]
struct Queue {
    next_id: TimerId,
    next_seq: u64,
    entries: HashMap<TimerId, Entry>,
}

impl Queue {
    fn insert(&mut self, due: DateTime<Utc>, period: Duration, callback: Callback) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        let seq = self.bump_seq();
        self.entries.insert(
            id,
            Entry {
                due,
                seq,
                period,
                callback: Some(callback),
            },
        );
        id
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Earliest runnable timer due at or before `limit`.
    fn next_due(&self, limit: DateTime<Utc>) -> Option<(TimerId, DateTime<Utc>)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.callback.is_some() && e.due <= limit)
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(id, e)| (*id, e.due))
    }
}

/// Deterministic timer queue driven by a [`ManualClock`].
///
/// Nothing fires on its own: [`advance`](Self::advance) moves the clock
/// forward, stopping at each due timer in order and running its callback
/// with the clock set to that timer's due instant.
pub struct VirtualTimers {
    clock: ManualClock,
    queue: RefCell<Queue>,
}

impl VirtualTimers {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            clock: ManualClock::starting_at(start),
            queue: RefCell::new(Queue::default()),
        }
    }

    /// A handle to the shared clock.
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    /// Number of scheduled timers.
    pub fn pending(&self) -> usize {
        self.queue.borrow().entries.len()
    }

    /// Advance time by `by`, firing every timer that comes due on the way.
    pub fn advance(&self, by: Duration) {
        self.advance_to(instant_after(self.clock.now(), by));
    }

    /// Advance time to `target`, firing every timer due at or before it.
    /// Timers scheduled by callbacks during the advance fire too if they
    /// fall inside the window.
    pub fn advance_to(&self, target: DateTime<Utc>) {
        loop {
            let next = self.queue.borrow().next_due(target);
            let Some((id, due)) = next else { break };
            if due > self.clock.now() {
                self.clock.set(due);
            }
            self.fire(id);
        }
        if target > self.clock.now() {
            self.clock.set(target);
        }
    }

    fn fire(&self, id: TimerId) {
        let callback = {
            let mut queue = self.queue.borrow_mut();
            let taken = queue.entries.get_mut(&id).and_then(|e| e.callback.take());
            match taken {
                Some(Callback::Timeout(cb)) => {
                    queue.entries.remove(&id);
                    Callback::Timeout(cb)
                }
                Some(other) => other,
                None => return,
            }
        };

        match callback {
            Callback::Timeout(cb) => {
                tracing::trace!(id, "timeout fired");
                cb();
            }
            Callback::Interval(mut cb) => {
                tracing::trace!(id, "interval fired");
                let flow = cb();
                let mut queue = self.queue.borrow_mut();
                if flow.is_break() {
                    queue.entries.remove(&id);
                    return;
                }
                let seq = queue.bump_seq();
                // Cleared from inside the callback: the entry is gone.
                if let Some(entry) = queue.entries.get_mut(&id) {
                    entry.due = instant_after(entry.due, entry.period);
                    entry.seq = seq;
                    entry.callback = Some(Callback::Interval(cb));
                }
            }
        }
    }
}

impl Clock for VirtualTimers {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl Timers for VirtualTimers {
    fn set_timeout(&self, delay: Duration, callback: TimeoutFn) -> TimerId {
        let due = instant_after(self.clock.now(), delay);
        self.queue
            .borrow_mut()
            .insert(due, Duration::ZERO, Callback::Timeout(callback))
    }

    fn set_interval(&self, period: Duration, callback: IntervalFn) -> TimerId {
        let period = period.max(MIN_PERIOD);
        let due = instant_after(self.clock.now(), period);
        self.queue
            .borrow_mut()
            .insert(due, period, Callback::Interval(callback))
    }

    fn clear(&self, id: TimerId) {
        self.queue.borrow_mut().entries.remove(&id);
    }

    fn is_active(&self, id: TimerId) -> bool {
        self.queue.borrow().entries.contains_key(&id)
    }
}
