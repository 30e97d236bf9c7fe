//! Calendar-day date arithmetic.
//!
//! All dates are naive wall-clock calendar days: no timezone, no DST
//! correction. Durations and spans are inclusive day counts.

use chrono::{Duration, NaiveDate};
use thiserror::Error;

const ISO_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid ISO date: {0:?}")]
    Invalid(String),
}

/// Parse a `YYYY-MM-DD` string.
pub fn parse_date(s: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(s.trim(), ISO_FORMAT).map_err(|_| DateError::Invalid(s.to_string()))
}

/// Format as `YYYY-MM-DD`; exact inverse of [`parse_date`].
pub fn format_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

pub fn add_days(date: NaiveDate, days: i32) -> NaiveDate {
    date + Duration::days(days as i64)
}

/// Signed whole-day difference `b - a`.
pub fn day_offset(a: NaiveDate, b: NaiveDate) -> i32 {
    (b - a).num_days() as i32
}

/// Inclusive span in days, floored at 1 so an inverted range repairs to a
/// one-day task instead of producing a non-positive duration.
pub fn inclusive_span_days(start: NaiveDate, end: NaiveDate) -> i32 {
    (day_offset(start, end) + 1).max(1)
}

/// Today's date (UTC wall clock).
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
