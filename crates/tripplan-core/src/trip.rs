//! Trip validation and calendar helpers.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use tripplan_db::models::Trip;

/// Reasons a trip cannot seed an itinerary request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("trip id must be positive, got {0}")]
    NonPositiveId(i64),

    #[error("trip city is empty")]
    MissingCity,

    #[error("trip country is empty")]
    MissingCountry,

    #[error("trip ends ({end}) before it starts ({start})")]
    InvertedDates { start: NaiveDate, end: NaiveDate },
}

/// Number of calendar days from `start` to `end`, both inclusive.
///
/// Returns zero or a negative count when `end` precedes `start`.
pub fn day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Check that `trip` can seed a generation request and return its day count.
pub fn validate_trip(trip: &Trip) -> Result<i32, ValidationError> {
    if trip.id <= 0 {
        return Err(ValidationError::NonPositiveId(trip.id));
    }
    if trip.city.trim().is_empty() {
        return Err(ValidationError::MissingCity);
    }
    if trip.country.trim().is_empty() {
        return Err(ValidationError::MissingCountry);
    }
    if trip.end_date < trip.start_date {
        return Err(ValidationError::InvertedDates {
            start: trip.start_date,
            end: trip.end_date,
        });
    }

    // chrono's date range keeps this well inside i32.
    let days = day_count(trip.start_date, trip.end_date);
    Ok(i32::try_from(days).unwrap_or(i32::MAX))
}

/// Human-friendly trip length, e.g. "1 day" or "5 days".
pub fn duration_text(start: NaiveDate, end: NaiveDate) -> String {
    match day_count(start, end) {
        n if n <= 0 => "0 days".to_owned(),
        1 => "1 day".to_owned(),
        n => format!("{n} days"),
    }
}

/// Compact date range, collapsing the shared month and year:
///
/// - `Sep 5–9, 2025`
/// - `Apr 27–May 3, 2025`
/// - `Dec 30, 2025–Jan 2, 2026`
pub fn short_range_text(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() != end.year() {
        return format!("{}–{}", start.format("%b %-d, %Y"), end.format("%b %-d, %Y"));
    }
    if start.month() == end.month() {
        format!("{}–{}", start.format("%b %-d"), end.format("%-d, %Y"))
    } else {
        format!("{}–{}", start.format("%b %-d"), end.format("%b %-d, %Y"))
    }
}
