//! Callback rate limiters for high-frequency input (scroll, resize, keys).
//!
//! Both limiters are single-threaded and lean on a [`Timers`](crate::system::Timers)
//! port for their deferred work, so they run the same way against
//! [`VirtualTimers`](crate::runtime::VirtualTimers) in tests and
//! [`TokioTimers`](crate::runtime::TokioTimers) in a live loop.

pub mod debounce;
pub mod throttle;

pub use debounce::{Debounce, Edge};
pub use throttle::Throttle;
