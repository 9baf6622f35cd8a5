use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::system::{TimerId, Timers};

/// Lets at most one call through per `interval`.
///
/// The first call runs `action` immediately and suppresses the limiter for
/// `interval`. Calls that arrive while suppressed are dropped, not queued,
/// and there is no trailing call. Once the interval has elapsed the next
/// call goes straight through again.
pub struct Throttle<A> {
    timers: Rc<dyn Timers>,
    interval: Duration,
    action: A,
    suppressed: Rc<Cell<bool>>,
    release: Option<TimerId>,
}

impl<A> Throttle<A> {
    /// A zero interval is accepted: the limiter re-opens on the next timer turn.
    pub fn new(timers: Rc<dyn Timers>, interval: Duration, action: A) -> Self {
        Self {
            timers,
            interval,
            action,
            suppressed: Rc::new(Cell::new(false)),
            release: None,
        }
    }

    /// Invoke the action unless suppressed. Returns whether it ran.
    pub fn call<T>(&mut self, args: T) -> bool
    where
        A: FnMut(T),
    {
        if self.suppressed.get() {
            return false;
        }
        (self.action)(args);
        self.suppressed.set(true);
        let flag = Rc::clone(&self.suppressed);
        self.release = Some(
            self.timers
                .set_timeout(self.interval, Box::new(move || flag.set(false))),
        );
        true
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.get()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<A> Drop for Throttle<A> {
    fn drop(&mut self) {
        if let Some(id) = self.release.take() {
            self.timers.clear(id);
        }
    }
}
