//! Timestamp normalization for heterogeneous store values.
//!
//! Attendance documents arrive with three timestamp shapes: the store's
//! native timestamp wrapper, a millisecond epoch number, or a loosely
//! formatted string. This module models them as a single tagged union,
//! [`TimestampValue`], consumed by one [`parse`] dispatch. Parsing is pure
//! and total: it returns `None` on failure rather than raising, and callers
//! treat `None` as "unknown / use fallback field".

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The store-native timestamp wrapper: seconds since the epoch plus a
/// nanosecond remainder, as serialized by the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTimestamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Nanosecond fraction within the second.
    pub nanos: u32,
}

impl StoreTimestamp {
    /// Converts the wrapper to a canonical instant.
    ///
    /// Returns `None` if the value is outside the representable range.
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

/// A timestamp as it appears in a store document.
///
/// The variants are tried in declaration order during deserialization:
/// an object with `seconds`/`nanos` is the native wrapper, a bare number is
/// a millisecond epoch, anything else is kept as text for [`parse`] to
/// interpret.
///
/// # Example
///
/// ```
/// use attendance_engine::timeparse::{parse, TimestampValue};
///
/// let value: TimestampValue = serde_json::from_str("1711444500000").unwrap();
/// assert!(matches!(value, TimestampValue::Epoch(_)));
/// assert!(parse(&value).is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampValue {
    /// The store-native timestamp wrapper.
    Native(StoreTimestamp),
    /// Milliseconds since the Unix epoch.
    Epoch(i64),
    /// A loosely formatted string.
    Text(String),
}

/// Normalizes any timestamp representation into a canonical instant.
///
/// String parsing first strips common human phrasing — the literal word
/// `at` and any trailing `UTC±N` zone suffix — then attempts standard date
/// formats in order. Never panics; `None` means the value was unparseable.
///
/// # Example
///
/// ```
/// use attendance_engine::timeparse::{parse, TimestampValue};
///
/// let human = TimestampValue::Text("26 March 2024 at 09:15:00 UTC+8".to_string());
/// let instant = parse(&human).unwrap();
/// assert_eq!(instant.to_rfc3339(), "2024-03-26T09:15:00+00:00");
///
/// assert!(parse(&TimestampValue::Text("not a date".to_string())).is_none());
/// ```
pub fn parse(value: &TimestampValue) -> Option<DateTime<Utc>> {
    match value {
        TimestampValue::Native(ts) => ts.to_instant(),
        TimestampValue::Epoch(millis) => DateTime::from_timestamp_millis(*millis),
        TimestampValue::Text(text) => parse_text(text),
    }
}

/// Interprets a raw JSON field as a timestamp.
///
/// Convenience for code that sorts or filters store documents without
/// decoding them into domain records first.
pub fn parse_json(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    serde_json::from_value::<TimestampValue>(value.clone())
        .ok()
        .and_then(|ts| parse(&ts))
}

/// Parses a loosely formatted date/time string.
fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    let cleaned = normalize_phrasing(text);
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(parsed.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: [&str; 2] = ["%d %B %Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"];
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Some(parsed.and_utc());
        }
    }

    const DATE_FORMATS: [&str; 2] = ["%d %B %Y", "%Y-%m-%d"];
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(&cleaned, format) {
            return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

/// Strips the literal word `at` and any `UTC±N` suffix, collapsing the
/// surrounding whitespace.
fn normalize_phrasing(text: &str) -> String {
    let without_zone = match text.find("UTC") {
        Some(index) => &text[..index],
        None => text,
    };

    without_zone
        .split_whitespace()
        .filter(|word| !word.eq_ignore_ascii_case("at"))
        .collect::<Vec<_>>()
        .join(" ")
}
