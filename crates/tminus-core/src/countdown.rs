use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::delta::{pad_number, time_difference, TimeDelta, Unit};
use crate::system::{Clock, TimerId, Timers};

/// Tick period of a countdown unless configured otherwise.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

/// Output sink for countdown values, one slot per [`Unit`].
pub trait SlotSink {
    /// Write a formatted value into the slot for `unit`.
    fn write(&mut self, unit: Unit, value: &str);

    /// Called after every unit of a render has been written.
    fn commit(&mut self) {}
}

/// Lifecycle of a [`Countdown`]. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Stopped,
}

/// Tunables for a [`Countdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownOptions {
    pub period: Duration,
    /// Minimum digits per slot.
    pub pad_width: usize,
    /// Slots to write, in write order. Units without a slot are skipped.
    pub units: Vec<Unit>,
}

impl Default for CountdownOptions {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            pad_width: 2,
            units: Unit::ALL.to_vec(),
        }
    }
}

struct Driver {
    clock: Rc<dyn Clock>,
    target: DateTime<Utc>,
    sink: Box<dyn SlotSink>,
    pad_width: usize,
    units: Vec<Unit>,
    state: DriverState,
    ticks: u64,
    remaining: TimeDelta,
}

impl Driver {
    /// Write the current values. Breaks once the target is reached, after
    /// writing zeros to every slot.
    fn render(&mut self) -> ControlFlow<()> {
        let delta = time_difference(self.target, self.clock.now());
        self.remaining = delta;

        if delta.is_elapsed() {
            let zero = pad_number(0, self.pad_width);
            for &unit in &self.units {
                self.sink.write(unit, &zero);
            }
            self.sink.commit();
            self.state = DriverState::Stopped;
            tracing::info!(target_at = %self.target, ticks = self.ticks, "countdown reached target");
            return ControlFlow::Break(());
        }

        for &unit in &self.units {
            self.sink.write(unit, &pad_number(delta.get(unit), self.pad_width));
        }
        self.sink.commit();
        tracing::trace!(remaining = %delta, "countdown tick");
        ControlFlow::Continue(())
    }
}

/// A running countdown to a fixed instant.
///
/// Renders once on start, then once per period until the target is
/// reached: at that tick every slot shows zeros, the repeating timer is
/// cancelled and the driver is `Stopped` for good. There is no pause or
/// restart; build a new `Countdown` instead. Dropping the handle stops it.
pub struct Countdown {
    timers: Rc<dyn Timers>,
    driver: Rc<RefCell<Driver>>,
    timer: Option<TimerId>,
}

impl Countdown {
    /// Start with [`CountdownOptions::default`].
    pub fn start(
        clock: Rc<dyn Clock>,
        timers: Rc<dyn Timers>,
        target: DateTime<Utc>,
        sink: Box<dyn SlotSink>,
    ) -> Self {
        Self::start_with(clock, timers, target, sink, CountdownOptions::default())
    }

    pub fn start_with(
        clock: Rc<dyn Clock>,
        timers: Rc<dyn Timers>,
        target: DateTime<Utc>,
        sink: Box<dyn SlotSink>,
        options: CountdownOptions,
    ) -> Self {
        let no_slots = options.units.is_empty();
        let driver = Rc::new(RefCell::new(Driver {
            clock,
            target,
            sink,
            pad_width: options.pad_width,
            units: options.units,
            state: DriverState::Running,
            ticks: 0,
            remaining: TimeDelta::ZERO,
        }));

        // Nothing to display: never render or tick.
        if no_slots {
            driver.borrow_mut().state = DriverState::Stopped;
            tracing::debug!(target_at = %target, "countdown has no slots, not starting");
            return Self {
                timers,
                driver,
                timer: None,
            };
        }

        let first = driver.borrow_mut().render();
        let timer = if first.is_continue() {
            let ticking = Rc::clone(&driver);
            let id = timers.set_interval(
                options.period,
                Box::new(move || {
                    let mut driver = ticking.borrow_mut();
                    driver.ticks += 1;
                    driver.render()
                }),
            );
            tracing::debug!(target_at = %target, period = ?options.period, "countdown started");
            Some(id)
        } else {
            tracing::debug!(target_at = %target, "countdown target already reached");
            None
        };

        Self {
            timers,
            driver,
            timer,
        }
    }

    pub fn state(&self) -> DriverState {
        self.driver.borrow().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == DriverState::Running
    }

    /// Timer ticks so far, not counting the render on start.
    pub fn ticks(&self) -> u64 {
        self.driver.borrow().ticks
    }

    /// The delta written by the latest render.
    pub fn remaining(&self) -> TimeDelta {
        self.driver.borrow().remaining
    }

    pub fn target(&self) -> DateTime<Utc> {
        self.driver.borrow().target
    }

    /// Tear down: cancel the repeating timer. Slots keep their last values.
    pub fn stop(&mut self) {
        if let Some(id) = self.timer.take() {
            self.timers.clear(id);
        }
        self.driver.borrow_mut().state = DriverState::Stopped;
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::VirtualTimers;

    #[derive(Clone, Default)]
    struct Recording {
        writes: Rc<RefCell<Vec<(Unit, String)>>>,
        commits: Rc<RefCell<u32>>,
    }

    impl SlotSink for Recording {
        fn write(&mut self, unit: Unit, value: &str) {
            self.writes.borrow_mut().push((unit, value.to_string()));
        }

        fn commit(&mut self) {
            *self.commits.borrow_mut() += 1;
        }
    }

    impl Recording {
        /// Values of the most recent render, in write order.
        fn last_render(&self, slots: usize) -> Vec<String> {
            let writes = self.writes.borrow();
            writes[writes.len() - slots..]
                .iter()
                .map(|(_, v)| v.clone())
                .collect()
        }
    }

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn start(
        timers: &Rc<VirtualTimers>,
        target: DateTime<Utc>,
        options: CountdownOptions,
    ) -> (Countdown, Recording) {
        let sink = Recording::default();
        let countdown = Countdown::start_with(
            Rc::new(timers.clock()),
            timers.clone(),
            target,
            Box::new(sink.clone()),
            options,
        );
        (countdown, sink)
    }

    #[test]
    fn renders_on_start() {
        let timers = Rc::new(VirtualTimers::starting_at(epoch()));
        let target = epoch() + chrono::Duration::days(3) + chrono::Duration::minutes(5);
        let (countdown, sink) = start(&timers, target, CountdownOptions::default());

        assert!(countdown.is_running());
        assert_eq!(sink.last_render(4), ["03", "00", "05", "00"]);
        assert_eq!(countdown.ticks(), 0);
    }

    #[test]
    fn past_target_starts_stopped_with_zeros() {
        let timers = Rc::new(VirtualTimers::starting_at(epoch()));
        let (countdown, sink) = start(
            &timers,
            epoch() - chrono::Duration::hours(1),
            CountdownOptions::default(),
        );

        assert_eq!(countdown.state(), DriverState::Stopped);
        assert_eq!(sink.last_render(4), ["00", "00", "00", "00"]);
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn only_configured_units_are_written() {
        let timers = Rc::new(VirtualTimers::starting_at(epoch()));
        let options = CountdownOptions {
            units: vec![Unit::Hours, Unit::Seconds],
            pad_width: 3,
            ..CountdownOptions::default()
        };
        let (_countdown, sink) = start(&timers, epoch() + chrono::Duration::seconds(3_661), options);

        let writes = sink.writes.borrow();
        assert_eq!(
            *writes,
            [(Unit::Hours, "001".to_string()), (Unit::Seconds, "001".to_string())]
        );
    }

    #[test]
    fn no_slots_never_starts() {
        let timers = Rc::new(VirtualTimers::starting_at(epoch()));
        let options = CountdownOptions {
            units: Vec::new(),
            ..CountdownOptions::default()
        };
        let (countdown, sink) = start(&timers, epoch() + chrono::Duration::minutes(1), options);

        assert_eq!(countdown.state(), DriverState::Stopped);
        assert_eq!(timers.pending(), 0);
        timers.advance(Duration::from_secs(5));
        assert_eq!(*sink.commits.borrow(), 0);
        assert!(sink.writes.borrow().is_empty());
        assert_eq!(countdown.ticks(), 0);
    }

    #[test]
    fn custom_period() {
        let timers = Rc::new(VirtualTimers::starting_at(epoch()));
        let options = CountdownOptions {
            period: Duration::from_millis(250),
            ..CountdownOptions::default()
        };
        let (countdown, _sink) = start(&timers, epoch() + chrono::Duration::seconds(10), options);

        timers.advance(Duration::from_secs(1));
        assert_eq!(countdown.ticks(), 4);
    }

    #[test]
    fn stop_cancels_timer_and_keeps_last_values() {
        let timers = Rc::new(VirtualTimers::starting_at(epoch()));
        let (mut countdown, sink) = start(
            &timers,
            epoch() + chrono::Duration::minutes(1),
            CountdownOptions::default(),
        );

        timers.advance(Duration::from_secs(2));
        countdown.stop();
        let commits = *sink.commits.borrow();
        assert_eq!(countdown.state(), DriverState::Stopped);
        assert_eq!(timers.pending(), 0);

        timers.advance(Duration::from_secs(10));
        assert_eq!(*sink.commits.borrow(), commits);
        assert_eq!(sink.last_render(4), ["00", "00", "00", "58"]);
    }

    #[test]
    fn drop_stops_timer() {
        let timers = Rc::new(VirtualTimers::starting_at(epoch()));
        let (countdown, _sink) = start(
            &timers,
            epoch() + chrono::Duration::minutes(1),
            CountdownOptions::default(),
        );
        assert_eq!(timers.pending(), 1);
        drop(countdown);
        assert_eq!(timers.pending(), 0);
    }
}
