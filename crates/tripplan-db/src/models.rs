use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row in the `trips` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: i64,
    pub title: String,
    pub city: String,
    pub country: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for inserting a new trip row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrip {
    pub title: String,
    pub city: String,
    pub country: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

/// A row in the `day_plans` table: one day of a trip's itinerary.
///
/// For a given trip the stored `day_number` values are `1..=day_count`
/// with no gaps or duplicates; the set is only ever replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DayPlan {
    pub trip_id: i64,
    pub day_number: i32,
    pub summary: String,
    pub description: String,
}

impl DayPlan {
    pub fn new(
        trip_id: i64,
        day_number: i32,
        summary: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            trip_id,
            day_number,
            summary: summary.into(),
            description: description.into(),
        }
    }
}
