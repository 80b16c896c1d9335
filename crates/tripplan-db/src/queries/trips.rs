//! Database query functions for the `trips` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{NewTrip, Trip};

/// Insert a new trip row. Returns the inserted trip with server-generated
/// defaults (id, created_at).
pub async fn insert_trip(pool: &PgPool, new: &NewTrip) -> Result<Trip> {
    let trip = sqlx::query_as::<_, Trip>(
        "INSERT INTO trips (title, city, country, start_date, end_date, notes) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(new.title.trim())
    .bind(new.city.trim())
    .bind(new.country.trim())
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(&new.notes)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert trip {:?}", new.title))?;

    Ok(trip)
}

/// Fetch a trip by its ID.
pub async fn get_trip(pool: &PgPool, id: i64) -> Result<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch trip {id}"))?;

    Ok(trip)
}

/// List all trips, soonest departure first.
pub async fn list_trips(pool: &PgPool) -> Result<Vec<Trip>> {
    let trips = sqlx::query_as::<_, Trip>("SELECT * FROM trips ORDER BY start_date, id")
        .fetch_all(pool)
        .await
        .context("failed to list trips")?;

    Ok(trips)
}

/// Delete a trip (its day plans cascade). Returns `false` if no such trip.
pub async fn delete_trip(pool: &PgPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM trips WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete trip {id}"))?;

    Ok(result.rows_affected() > 0)
}
