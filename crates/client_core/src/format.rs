//! Conversions from raw on-chain seconds to display strings.

use chrono::{DateTime, SecondsFormat, Utc};
use shared::view::{UNSET_TIMESTAMP, ZERO_ELAPSED};

/// Formats a duration as `H:MM:SS`; hours are unpadded and unbounded.
pub fn format_seconds_hhmmss(seconds: i128) -> String {
    if seconds < 0 {
        return ZERO_ELAPSED.to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}:{minutes:02}:{secs:02}")
}

/// Elapsed time for a raw read; missing or out-of-range values render as zero.
pub fn format_elapsed(raw: Option<u128>) -> String {
    match raw.and_then(|value| i128::try_from(value).ok()) {
        Some(seconds) => format_seconds_hhmmss(seconds),
        None => ZERO_ELAPSED.to_string(),
    }
}

/// ISO-8601 UTC with millisecond precision, or `N/A` when not strictly positive.
pub fn format_timestamp(seconds: i128) -> String {
    if seconds <= 0 {
        return UNSET_TIMESTAMP.to_string();
    }
    i64::try_from(seconds)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| UNSET_TIMESTAMP.to_string())
}

pub fn format_raw_timestamp(raw: Option<u128>) -> String {
    match raw.and_then(|value| i128::try_from(value).ok()) {
        Some(seconds) => format_timestamp(seconds),
        None => UNSET_TIMESTAMP.to_string(),
    }
}
