use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MS_PER_SECOND: u64 = 1_000;
pub const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
pub const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// A countdown field, also the lookup key of a display slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl Unit {
    /// All units, largest first (display order).
    pub const ALL: [Unit; 4] = [Unit::Days, Unit::Hours, Unit::Minutes, Unit::Seconds];

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Days => "days",
            Unit::Hours => "hours",
            Unit::Minutes => "minutes",
            Unit::Seconds => "seconds",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remaining time until a target instant, decomposed into whole units.
///
/// Produced only by [`time_difference`]. When `total_ms` is zero every
/// other field is zero as well: the target has been reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDelta {
    pub days: u64,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub total_ms: u64,
}

impl TimeDelta {
    pub const ZERO: TimeDelta = TimeDelta {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        total_ms: 0,
    };

    /// Decompose a positive millisecond count. Strict base conversion:
    /// no calendar or timezone semantics.
    pub fn from_millis(total_ms: u64) -> Self {
        Self {
            days: total_ms / MS_PER_DAY,
            hours: ((total_ms % MS_PER_DAY) / MS_PER_HOUR) as u32,
            minutes: ((total_ms % MS_PER_HOUR) / MS_PER_MINUTE) as u32,
            seconds: ((total_ms % MS_PER_MINUTE) / MS_PER_SECOND) as u32,
            total_ms,
        }
    }

    /// `true` once the target instant has been reached or passed.
    pub fn is_elapsed(&self) -> bool {
        self.total_ms == 0
    }

    pub fn get(&self, unit: Unit) -> u64 {
        match unit {
            Unit::Days => self.days,
            Unit::Hours => u64::from(self.hours),
            Unit::Minutes => u64::from(self.minutes),
            Unit::Seconds => u64::from(self.seconds),
        }
    }
}

impl fmt::Display for TimeDelta {
    /// `DD:HH:MM:SS`, days padded to two digits minimum.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Time remaining from `now` until `target`.
///
/// A target at or before `now` yields [`TimeDelta::ZERO`]; that is the
/// terminal state of a countdown, not an error.
pub fn time_difference(target: DateTime<Utc>, now: DateTime<Utc>) -> TimeDelta {
    let diff = target.signed_duration_since(now).num_milliseconds();
    if diff <= 0 {
        return TimeDelta::ZERO;
    }
    TimeDelta::from_millis(diff as u64)
}

/// Zero-pad `n` to at least `width` digits. Wider numbers are not truncated.
pub fn pad_number(n: u64, width: usize) -> String {
    format!("{n:0width$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-10-07T08:00:00-03:00")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn exactly_one_second() {
        let now = base();
        let delta = time_difference(now + Duration::milliseconds(1000), now);
        assert_eq!(
            delta,
            TimeDelta { days: 0, hours: 0, minutes: 0, seconds: 1, total_ms: 1000 }
        );
    }

    #[test]
    fn zero_and_negative_are_terminal() {
        let now = base();
        assert_eq!(time_difference(now, now), TimeDelta::ZERO);
        assert_eq!(time_difference(now - Duration::days(3), now), TimeDelta::ZERO);
        assert!(time_difference(now, now).is_elapsed());
    }

    #[test]
    fn decomposes_with_carry() {
        let now = base();
        let target = now
            + Duration::days(12)
            + Duration::hours(23)
            + Duration::minutes(59)
            + Duration::seconds(59)
            + Duration::milliseconds(999);
        let delta = time_difference(target, now);
        assert_eq!(delta.days, 12);
        assert_eq!(delta.hours, 23);
        assert_eq!(delta.minutes, 59);
        assert_eq!(delta.seconds, 59);
        assert_eq!(delta.total_ms, 12 * MS_PER_DAY + 23 * MS_PER_HOUR + 59 * MS_PER_MINUTE + 59_999);
    }

    #[test]
    fn sub_second_remainder_is_dropped_not_rounded() {
        let now = base();
        let delta = time_difference(now + Duration::milliseconds(1999), now);
        assert_eq!(delta.seconds, 1);
        assert_eq!(delta.total_ms, 1999);

        let delta = time_difference(now + Duration::milliseconds(1), now);
        assert_eq!(delta.seconds, 0);
        assert!(!delta.is_elapsed());
    }

    #[test]
    fn bounds_hold_across_a_sweep() {
        let now = base();
        // Step by a prime so the sweep crosses every unit boundary.
        let mut ms: i64 = 1;
        while ms < 3 * MS_PER_DAY as i64 {
            let d = time_difference(now + Duration::milliseconds(ms), now);
            let floor = d.days * MS_PER_DAY
                + u64::from(d.hours) * MS_PER_HOUR
                + u64::from(d.minutes) * MS_PER_MINUTE
                + u64::from(d.seconds) * MS_PER_SECOND;
            assert_eq!(d.total_ms, ms as u64);
            assert!(floor <= d.total_ms && d.total_ms < floor + MS_PER_SECOND, "ms={ms}");
            assert!(d.hours < 24 && d.minutes < 60 && d.seconds < 60);
            ms += 7_919_993;
        }
    }

    #[test]
    fn pure_for_fixed_inputs() {
        let now = base();
        let target = now + Duration::hours(5);
        assert_eq!(time_difference(target, now), time_difference(target, now));
    }

    #[test]
    fn pad_and_display() {
        assert_eq!(pad_number(7, 2), "07");
        assert_eq!(pad_number(0, 2), "00");
        assert_eq!(pad_number(123, 2), "123");
        assert_eq!(pad_number(5, 3), "005");
        assert_eq!(TimeDelta::from_millis(MS_PER_DAY + 61_000).to_string(), "01:00:01:01");
    }

    #[test]
    fn unit_lookup() {
        let d = TimeDelta::from_millis(2 * MS_PER_DAY + 3 * MS_PER_HOUR + 4 * MS_PER_MINUTE + 5_000);
        let values: Vec<u64> = Unit::ALL.iter().map(|u| d.get(*u)).collect();
        assert_eq!(values, [2, 3, 4, 5]);
        assert_eq!(Unit::Minutes.to_string(), "minutes");
    }
}
