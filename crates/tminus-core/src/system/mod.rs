//! Host-environment traits.
//!
//! The core never touches a wall clock, a timer loop or a storage backend
//! directly. Runtimes implement these traits; see [`crate::runtime`].

pub mod persistence;
pub mod timing;

pub use persistence::Persistence;
pub use timing::{Clock, IntervalFn, SystemClock, TimeoutFn, TimerId, Timers};
