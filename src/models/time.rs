//! Timestamp normalization
//!
//! The backend is not consistent about how it sends instants: ISO-8601
//! strings, `datetime-local` strings without an offset, epoch seconds or
//! milliseconds, and Firestore-style `{_seconds, _nanoseconds}` objects all
//! show up. Everything is normalized to `DateTime<Utc>`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Epoch values at or above this are milliseconds (year 5138 in seconds)
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Format used by HTML `datetime-local` inputs
pub const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Normalize any JSON timestamp representation
pub fn normalize_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_epoch),
        Value::Object(map) => {
            let seconds = map
                .get("_seconds")
                .or_else(|| map.get("seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("_nanoseconds")
                .or_else(|| map.get("nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, nanos as u32)
        }
        _ => None,
    }
}

/// Parse a timestamp string; offset-less values are taken as UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    s.parse::<i64>().ok().and_then(from_epoch)
}

fn from_epoch(n: i64) -> Option<DateTime<Utc>> {
    if n.abs() >= MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}

/// Value for a `datetime-local` input, empty when the instant is unknown
pub fn to_input_value(dt: Option<DateTime<Utc>>) -> String {
    dt.map(|dt| dt.format(INPUT_FORMAT).to_string())
        .unwrap_or_default()
}

/// Short human format used in tables
pub fn display(dt: Option<DateTime<Utc>>) -> String {
    dt.map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
