//! Clock-time normalization for snapshot timestamps.

use chrono::{DateTime, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%a, %d %b %Y %H:%M:%S GMT",
];

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M:%S %p"];

/// Extracts the clock time from a snapshot timestamp as 24-hour `HH:MM`.
///
/// The date part, if any, is discarded. Accepts the backend's
/// `YYYY-MM-DD HH:MM` labels, ISO 8601, RFC 2822 (`Thu, 01 Mar 2012
/// 08:00:00 GMT`), bare clock times and 12-hour `hh:mm AM/PM`.
#[must_use]
pub fn normalize_clock_label(raw: &str) -> Option<String> {
    let raw = raw.trim();

    let time = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.time())
        .or_else(|| DateTime::parse_from_rfc2822(raw).ok().map(|dt| dt.time()))
        .or_else(|| {
            TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
        })?;

    Some(time.format("%H:%M").to_string())
}
