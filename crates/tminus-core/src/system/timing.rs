use std::ops::ControlFlow;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Opaque handle to a scheduled timer (0 is never issued).
pub type TimerId = u32;

/// One-shot timer callback.
pub type TimeoutFn = Box<dyn FnOnce()>;

/// Repeating timer callback. Returning `ControlFlow::Break(())` cancels the
/// interval from inside, the same as calling [`Timers::clear`] on it.
pub type IntervalFn = Box<dyn FnMut() -> ControlFlow<()>>;

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Timer platform trait: deferred and repeating callbacks on a
/// single-threaded event loop.
///
/// Callbacks run one at a time, in due order. A callback may schedule or
/// clear other timers, so implementations must not hold internal borrows
/// while one is running. Firing is allowed to drift when the loop is busy.
pub trait Timers {
    /// Run `callback` once, `delay` from now.
    fn set_timeout(&self, delay: Duration, callback: TimeoutFn) -> TimerId;

    /// Run `callback` every `period` until it breaks or is cleared.
    /// The first run happens one `period` from now.
    fn set_interval(&self, period: Duration, callback: IntervalFn) -> TimerId;

    /// Cancel a timer. Safe to call with a fired or unknown handle.
    fn clear(&self, id: TimerId);

    /// Whether the timer is still scheduled.
    fn is_active(&self, id: TimerId) -> bool;
}
