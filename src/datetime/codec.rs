//! Multi-format datetime codec
//!
//! Patterns use Python strftime spelling (`%Y-%m-%dT%H:%M:%S.%f%z`), since
//! that is what connector manifests carry. `%f` is six-digit microseconds
//! and `%s` is integer epoch seconds; both are mapped onto chrono here.
//!
//! Parsing tries each candidate pattern in order and returns the first
//! success, so callers that care about the canonical representation must put
//! it at position 0.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt::Write as _;

/// Patterns every codec accepts, tried after any caller-supplied candidates
pub const DEFAULT_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S.%f%z", "%Y-%m-%d", "%Y%m%d", "%s"];

/// Translate a Python strftime pattern into chrono's dialect.
///
/// The only divergence that matters here is `%f`: Python means six-digit
/// microseconds, chrono means nine-digit nanoseconds.
fn to_chrono_pattern(pattern: &str) -> String {
    pattern.replace("%f", "%6f")
}

/// Try to parse `text` with a single pattern.
///
/// Returns the instant in UTC. Inputs without an offset are assumed UTC;
/// date-only inputs resolve to midnight.
pub fn try_parse(text: &str, pattern: &str) -> Option<DateTime<Utc>> {
    if pattern == "%s" {
        let secs: i64 = text.parse().ok()?;
        return Utc.timestamp_opt(secs, 0).single();
    }

    let fmt = to_chrono_pattern(pattern);

    if let Ok(dt) = DateTime::parse_from_str(text, &fmt) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(text, &fmt) {
        return Some(DateTime::from_naive_utc_and_offset(ndt, Utc));
    }
    if let Ok(nd) = NaiveDate::parse_from_str(text, &fmt) {
        let ndt = nd.and_hms_opt(0, 0, 0).unwrap();
        return Some(DateTime::from_naive_utc_and_offset(ndt, Utc));
    }

    None
}

/// Parse `text` with an ordered candidate list; first match wins.
pub fn parse_any(text: &str, formats: &[impl AsRef<str>]) -> Result<DateTime<Utc>> {
    formats
        .iter()
        .find_map(|f| try_parse(text, f.as_ref()))
        .ok_or_else(|| Error::datetime_parse(text, formats))
}

/// Emit `dt` using `pattern`.
///
/// `%s` emits integer epoch seconds with no fractional part; date-only
/// patterns drop the time components.
pub fn format_datetime(dt: DateTime<Utc>, pattern: &str) -> Result<String> {
    if pattern == "%s" {
        return Ok(dt.timestamp().to_string());
    }

    let fmt = to_chrono_pattern(pattern);
    let mut out = String::new();
    write!(out, "{}", dt.format(&fmt))
        .map_err(|_| Error::datetime_format(pattern, "unsupported pattern"))?;
    Ok(out)
}
