//! Database query functions for the `day_plans` table.
//!
//! A trip's itinerary is never patched row by row: [`replace_day_plans`]
//! swaps the whole set inside one transaction, so readers observe either the
//! previous itinerary or the new one, never a mix.

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use tracing::debug;

use crate::models::DayPlan;

/// Atomically replace every day-plan row for `trip_id` with `rows`.
///
/// Deletes the existing rows and inserts `rows` within a single transaction.
/// If any statement fails the transaction is rolled back and the previously
/// committed itinerary stays in place. On success the committed rows are
/// re-read and returned ordered by `day_number`.
///
/// An empty `rows` slice is allowed and leaves the trip with no day plans.
/// Every row must carry `trip_id`; a row for another trip is rejected before
/// the transaction opens.
pub async fn replace_day_plans(
    pool: &PgPool,
    trip_id: i64,
    rows: &[DayPlan],
) -> Result<Vec<DayPlan>> {
    if let Some(stray) = rows.iter().find(|r| r.trip_id != trip_id) {
        bail!(
            "day plan for day {} belongs to trip {}, not trip {trip_id}",
            stray.day_number,
            stray.trip_id
        );
    }

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let deleted = sqlx::query("DELETE FROM day_plans WHERE trip_id = $1")
        .bind(trip_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to delete day plans for trip {trip_id}"))?
        .rows_affected();

    for row in rows {
        sqlx::query(
            "INSERT INTO day_plans (trip_id, day_number, summary, description) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(trip_id)
        .bind(row.day_number)
        .bind(&row.summary)
        .bind(&row.description)
        .execute(&mut *tx)
        .await
        .with_context(|| {
            format!(
                "failed to insert day plan {} for trip {trip_id}",
                row.day_number
            )
        })?;
    }

    // An early return above drops `tx` uncommitted, which rolls back.
    tx.commit().await.context("failed to commit transaction")?;

    debug!(trip_id, deleted, inserted = rows.len(), "replaced day plans");

    list_day_plans(pool, trip_id).await
}

/// Read the committed day plans for a trip, ordered by `day_number`.
pub async fn list_day_plans(pool: &PgPool, trip_id: i64) -> Result<Vec<DayPlan>> {
    let rows = sqlx::query_as::<_, DayPlan>(
        "SELECT trip_id, day_number, summary, description \
         FROM day_plans \
         WHERE trip_id = $1 \
         ORDER BY day_number ASC",
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list day plans for trip {trip_id}"))?;

    Ok(rows)
}

/// Count the stored day plans for a trip.
pub async fn count_day_plans(pool: &PgPool, trip_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM day_plans WHERE trip_id = $1")
        .bind(trip_id)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to count day plans for trip {trip_id}"))?;

    Ok(count)
}
