pub mod exif;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Epoch values need at least 9 digits so that a bare year is never read as a timestamp.
static EPOCH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d{9,}(\.\d+)?$").unwrap());

/// Epoch integers at or above this magnitude are milliseconds, below it seconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a stored media date into a UTC instant.
///
/// Every input is read as a UTC calendar date: offsets are converted, naive
/// values are taken as UTC. Anything unparseable is `None`, never an error.
pub fn parse_display_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // 1. RFC 3339 with offset or Z
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // 2. Naive date-time, assumed UTC
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    // 3. Plain calendar date
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }

    // 4. Epoch seconds or milliseconds
    if EPOCH_RE.is_match(s) {
        return parse_epoch(s);
    }

    None
}

fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    if s.contains('.') {
        let secs: f64 = s.parse().ok()?;
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round() as u32;
        return DateTime::from_timestamp(whole as i64, nanos.min(999_999_999));
    }
    let n: i64 = s.parse().ok()?;
    if n.abs() >= MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}

/// ISO rendering used for date-prefix search: `YYYY-MM-DDTHH:MM:SS` in UTC.
pub fn iso_string(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Parse a user-supplied calendar date (`YYYY-MM-DD`, or anything
/// `parse_display_date` accepts) to its UTC calendar day.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    parse_display_date(raw).map(|dt| dt.date_naive())
}
