//! Timestamp decoding for input records.

use crate::error::RejectReason;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Accepts RFC 3339 strings, naive `YYYY-MM-DD[T ]HH:MM:SS[.fff]` (read as UTC),
/// bare dates, and integer epoch milliseconds.
pub fn parse_timestamp(raw: &Value) -> Result<DateTime<Utc>, RejectReason> {
    match raw {
        Value::String(s) => parse_str(s.trim())
            .ok_or_else(|| RejectReason::UnparsableTimestamp(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| RejectReason::UnparsableTimestamp(n.to_string())),
        other => Err(RejectReason::UnparsableTimestamp(other.to_string())),
    }
}

fn parse_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
