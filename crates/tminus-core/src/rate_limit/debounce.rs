use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::system::{TimerId, Timers};

/// Which end of a burst a [`Debounce`] fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Fire once the input has been silent for the wait, with the last
    /// call's arguments.
    Trailing,
    /// Fire on the first call of a burst; later calls in the burst only
    /// extend the quiet window.
    Leading,
}

/// Delays an action until calls stop arriving for `wait`.
///
/// Every call cancels the pending timer and starts a new one, so a steady
/// stream of calls keeps pushing the action back. Only the most recent
/// arguments are kept. Dropping the limiter cancels any pending call.
pub struct Debounce<T> {
    timers: Rc<dyn Timers>,
    wait: Duration,
    edge: Edge,
    action: Rc<RefCell<dyn FnMut(T)>>,
    pending: Rc<Cell<Option<TimerId>>>,
}

impl<T: 'static> Debounce<T> {
    /// Trailing-edge debounce.
    pub fn new(timers: Rc<dyn Timers>, wait: Duration, action: impl FnMut(T) + 'static) -> Self {
        Self::with_edge(timers, wait, Edge::Trailing, action)
    }

    /// Leading-edge debounce.
    pub fn leading(timers: Rc<dyn Timers>, wait: Duration, action: impl FnMut(T) + 'static) -> Self {
        Self::with_edge(timers, wait, Edge::Leading, action)
    }

    fn with_edge(
        timers: Rc<dyn Timers>,
        wait: Duration,
        edge: Edge,
        action: impl FnMut(T) + 'static,
    ) -> Self {
        Self {
            timers,
            wait,
            edge,
            action: Rc::new(RefCell::new(action)),
            pending: Rc::new(Cell::new(None)),
        }
    }

    pub fn call(&mut self, args: T) {
        let burst_start = self.pending.get().is_none();
        self.cancel();

        let pending = Rc::clone(&self.pending);
        let id = match self.edge {
            Edge::Trailing => {
                let action = Rc::clone(&self.action);
                self.timers.set_timeout(
                    self.wait,
                    Box::new(move || {
                        pending.set(None);
                        (&mut *action.borrow_mut())(args);
                    }),
                )
            }
            Edge::Leading => {
                let id = self
                    .timers
                    .set_timeout(self.wait, Box::new(move || pending.set(None)));
                if burst_start {
                    (&mut *self.action.borrow_mut())(args);
                }
                id
            }
        };
        self.pending.set(Some(id));
    }

    /// Drop the pending call, if any.
    pub fn cancel(&mut self) {
        if let Some(id) = self.pending.take() {
            self.timers.clear(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }
}

impl<T> Drop for Debounce<T> {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take() {
            self.timers.clear(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::runtime::VirtualTimers;
    use crate::system::Clock;

    fn setup() -> Rc<VirtualTimers> {
        Rc::new(VirtualTimers::starting_at(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn burst_collapses_to_last_call() {
        let timers = setup();
        let start = timers.now();
        let clock = timers.clock();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        let mut debounced = Debounce::new(timers.clone(), ms(50), move |n: u32| {
            sink.borrow_mut().push((n, clock.now()))
        });

        for n in 1..=5 {
            debounced.call(n);
            timers.advance(ms(5));
        }
        // Last call at +20ms.
        assert!(debounced.is_pending());
        timers.advance(ms(44));
        assert!(fired.borrow().is_empty());
        timers.advance(ms(1));

        let fired = fired.borrow();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, 5);
        assert_eq!(fired[0].1, start + chrono::Duration::milliseconds(70));
        assert!(!debounced.is_pending());
    }

    #[test]
    fn separate_bursts_fire_separately() {
        let timers = setup();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let mut debounced = Debounce::new(timers.clone(), ms(50), move |()| c.set(c.get() + 1));
        assert_eq!(debounced.edge(), Edge::Trailing);

        debounced.call(());
        timers.advance(ms(60));
        debounced.call(());
        timers.advance(ms(60));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn leading_fires_at_burst_start_only() {
        let timers = setup();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        let mut debounced = Debounce::leading(timers.clone(), ms(50), move |n: u32| {
            sink.borrow_mut().push(n)
        });

        assert_eq!(debounced.edge(), Edge::Leading);
        debounced.call(1);
        assert_eq!(*fired.borrow(), [1]);
        for n in 2..=4 {
            timers.advance(ms(10));
            debounced.call(n);
        }
        timers.advance(ms(100));
        assert_eq!(*fired.borrow(), [1]);

        debounced.call(9);
        assert_eq!(*fired.borrow(), [1, 9]);
    }

    #[test]
    fn cancel_and_drop_discard_pending_call() {
        let timers = setup();
        let count = Rc::new(Cell::new(0));

        let c = Rc::clone(&count);
        let mut debounced = Debounce::new(timers.clone(), ms(50), move |()| c.set(c.get() + 1));
        debounced.call(());
        debounced.cancel();
        timers.advance(ms(100));
        assert_eq!(count.get(), 0);

        debounced.call(());
        drop(debounced);
        assert_eq!(timers.pending(), 0);
        timers.advance(ms(100));
        assert_eq!(count.get(), 0);
    }
}
