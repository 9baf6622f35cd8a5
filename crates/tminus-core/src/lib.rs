pub mod countdown;
pub mod delta;
pub mod error;
pub mod project;
pub mod rate_limit;
pub mod runtime;
pub mod storage;
pub mod system;

pub use countdown::{Countdown, CountdownOptions, DriverState, SlotSink, DEFAULT_PERIOD};
pub use delta::{pad_number, time_difference, TimeDelta, Unit};
pub use error::CoreError;
pub use rate_limit::{Debounce, Throttle};
