use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::CoreError;

/// Stand-in for a target that could not be parsed. It lies before any real
/// `now`, so a countdown built on it goes straight to its terminal state.
pub const ELAPSED: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a `+HH:MM` / `-HH:MM` offset. `Z` and `UTC` mean zero.
pub fn parse_offset(s: &str) -> Result<FixedOffset, CoreError> {
    let invalid = || CoreError::InvalidOffset(s.to_string());
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => return Err(invalid()),
    };
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Parse an ISO-like target instant.
///
/// Strings carrying an offset (RFC 3339) keep it. Strings without one are
/// read as wall time at `default_offset`. A bare date means midnight.
pub fn parse_target(s: &str, default_offset: FixedOffset) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    default_offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Like [`parse_target`], but an unparseable target becomes [`ELAPSED`].
pub fn resolve_target(s: &str, default_offset: FixedOffset) -> DateTime<Utc> {
    match parse_target(s, default_offset) {
        Some(instant) => instant,
        None => {
            tracing::warn!(target_str = s, "unparseable target instant, treating as elapsed");
            ELAPSED
        }
    }
}
