//! Concrete [`Clock`](crate::system::Clock) and [`Timers`](crate::system::Timers)
//! implementations.
//!
//! - [`VirtualTimers`]: time moves only when [`VirtualTimers::advance`] is
//!   called. Deterministic; used by tests and replays.
//! - [`TokioTimers`]: timers on a tokio `LocalSet`, paired with a
//!   [`TokioClock`] that reads wall time through tokio's clock.

pub mod tokio_local;
pub mod virtual_time;

pub use tokio_local::{TokioClock, TokioTimers};
pub use virtual_time::{ManualClock, VirtualTimers};

use std::time::Duration;

use chrono::{DateTime, Utc};

/// `at + d`, saturating at the end of representable time.
pub(crate) fn instant_after(at: DateTime<Utc>, d: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(d)
        .ok()
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Repeating timers never run with a zero period.
pub(crate) const MIN_PERIOD: Duration = Duration::from_millis(1);
