//! Single-unit ISO-8601 durations
//!
//! Step, granularity and lookback values are durations like `P1D`, `P2W`,
//! `P1M`, `P1Y` or `PT0.000001S`. Only one unit per value is accepted; that
//! is all connector manifests use and it keeps the calendar arithmetic
//! unambiguous.
//!
//! Month and year arithmetic is calendar-aware: the day-of-month is clamped
//! to the target month's length, so `2021-01-31 + P1M` is `2021-02-28`.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Months, Utc};
use std::fmt;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

/// A calendar-aware delta with a single unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoDuration {
    /// `PnY` - calendar years, day clamped
    Years(u32),
    /// `PnM` - calendar months, day clamped
    Months(u32),
    /// `PnW` - fixed seven-day weeks
    Weeks(i64),
    /// `PnD` - fixed 24-hour days
    Days(i64),
    /// `PTnS` - seconds, stored with microsecond resolution
    Microseconds(i64),
}

impl IsoDuration {
    /// Parse an ISO-8601 duration limited to a single unit.
    ///
    /// Fractional magnitudes are only accepted for seconds
    /// (`PT0.000001S` is one microsecond).
    pub fn parse(text: &str) -> Result<Self> {
        let body = text
            .strip_prefix('P')
            .ok_or_else(|| Error::duration(text, "must start with 'P'"))?;

        if let Some(time) = body.strip_prefix('T') {
            let magnitude = time
                .strip_suffix('S')
                .ok_or_else(|| Error::duration(text, "time component must end with 'S'"))?;
            let seconds: f64 = magnitude
                .parse()
                .map_err(|_| Error::duration(text, "invalid seconds magnitude"))?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(Error::duration(text, "magnitude must be non-negative"));
            }
            let micros = (seconds * MICROS_PER_SECOND as f64).round() as i64;
            return Ok(Self::Microseconds(micros));
        }

        if body.len() < 2 {
            return Err(Error::duration(text, "missing magnitude or unit"));
        }
        let (magnitude, unit) = body.split_at(body.len() - 1);
        let n: i64 = magnitude
            .parse()
            .map_err(|_| Error::duration(text, "invalid magnitude"))?;
        if n < 0 {
            return Err(Error::duration(text, "magnitude must be non-negative"));
        }

        match unit {
            "Y" => Ok(Self::Years(
                u32::try_from(n).map_err(|_| Error::duration(text, "magnitude too large"))?,
            )),
            "M" => Ok(Self::Months(
                u32::try_from(n).map_err(|_| Error::duration(text, "magnitude too large"))?,
            )),
            "W" => Ok(Self::Weeks(n)),
            "D" => Ok(Self::Days(n)),
            other => Err(Error::duration(text, format!("unknown unit '{other}'"))),
        }
    }

    /// Whether this duration has zero magnitude. Adding a zero duration is
    /// idempotent.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Years(n) | Self::Months(n) => *n == 0,
            Self::Weeks(n) | Self::Days(n) | Self::Microseconds(n) => *n == 0,
        }
    }

    /// `dt + self`, saturating at the latest representable instant
    pub fn add_to(&self, dt: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Years(n) => dt
                .checked_add_months(Months::new(n.saturating_mul(12)))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Self::Months(n) => dt
                .checked_add_months(Months::new(*n))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Self::Weeks(n) => Duration::try_weeks(*n)
                .and_then(|d| dt.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Self::Days(n) => Duration::try_days(*n)
                .and_then(|d| dt.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Self::Microseconds(n) => dt
                .checked_add_signed(Duration::microseconds(*n))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// `dt - self`, saturating at the earliest representable instant
    pub fn subtract_from(&self, dt: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Years(n) => dt
                .checked_sub_months(Months::new(n.saturating_mul(12)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            Self::Months(n) => dt
                .checked_sub_months(Months::new(*n))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            Self::Weeks(n) => Duration::try_weeks(*n)
                .and_then(|d| dt.checked_sub_signed(d))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            Self::Days(n) => Duration::try_days(*n)
                .and_then(|d| dt.checked_sub_signed(d))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            Self::Microseconds(n) => dt
                .checked_sub_signed(Duration::microseconds(*n))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Approximate length in microseconds, for ordering checks between
    /// durations of different units (month = 30 days, year = 365 days).
    pub(crate) fn approx_micros(&self) -> i128 {
        match self {
            Self::Years(n) => i128::from(*n) * 365 * i128::from(MICROS_PER_DAY),
            Self::Months(n) => i128::from(*n) * 30 * i128::from(MICROS_PER_DAY),
            Self::Weeks(n) => i128::from(*n) * 7 * i128::from(MICROS_PER_DAY),
            Self::Days(n) => i128::from(*n) * i128::from(MICROS_PER_DAY),
            Self::Microseconds(n) => i128::from(*n),
        }
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Years(n) => write!(f, "P{n}Y"),
            Self::Months(n) => write!(f, "P{n}M"),
            Self::Weeks(n) => write!(f, "P{n}W"),
            Self::Days(n) => write!(f, "P{n}D"),
            Self::Microseconds(n) => {
                if n % MICROS_PER_SECOND == 0 {
                    write!(f, "PT{}S", n / MICROS_PER_SECOND)
                } else {
                    write!(f, "PT{}S", *n as f64 / MICROS_PER_SECOND as f64)
                }
            }
        }
    }
}
