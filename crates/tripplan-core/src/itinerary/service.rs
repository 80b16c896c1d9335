//! Generation pipeline: validate, prompt, call the LLM, parse, normalize,
//! replace.
//!
//! Stages run strictly in sequence. Nothing is written until normalization
//! has produced the full set of rows, so every failure before the replace
//! step leaves the trip's previous itinerary in place.

use anyhow::Context;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tripplan_db::models::{DayPlan, Trip};
use tripplan_db::queries::{day_plans, trips};

use super::normalize::normalize;
use super::parser::parse_plan;
use super::prompt::build_prompt;
use crate::error::GenerateError;
use crate::llm::{ChatCompletion, LlmCredentials};
use crate::trip::{ValidationError, validate_trip};

/// Generate and persist a fresh itinerary for `trip`.
///
/// On success the trip's itinerary has been replaced by exactly one row per
/// calendar day, and those rows are returned ordered by day number.
///
/// `cancel` is honoured up to the start of the replace transaction. An
/// in-flight LLM call is abandoned when the token fires. Once the
/// transaction has begun, the write runs to completion or rolls back.
pub async fn generate_itinerary(
    pool: &PgPool,
    llm: &dyn ChatCompletion,
    trip: &Trip,
    credentials: &LlmCredentials,
    cancel: &CancellationToken,
) -> Result<Vec<DayPlan>, GenerateError> {
    let day_count = validate_trip(trip)?;
    info!(trip_id = trip.id, day_count, "generating itinerary");

    let prompt = build_prompt(trip, day_count);

    if cancel.is_cancelled() {
        return Err(GenerateError::Cancelled);
    }

    let raw = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!(trip_id = trip.id, "generation cancelled during LLM call");
            return Err(GenerateError::Cancelled);
        }
        reply = llm.complete(credentials, &prompt.system, &prompt.user) => reply?,
    };

    let parsed = parse_plan(&raw)?;
    debug!(
        trip_id = trip.id,
        items = parsed.days.len(),
        salvaged = parsed.salvaged,
        "parsed LLM reply"
    );

    let rows = normalize(&parsed.days, day_count, trip.id);

    if cancel.is_cancelled() {
        return Err(GenerateError::Cancelled);
    }

    let saved = day_plans::replace_day_plans(pool, trip.id, &rows)
        .await
        .map_err(GenerateError::Storage)?;

    info!(trip_id = trip.id, rows = saved.len(), "itinerary saved");
    Ok(saved)
}

/// Load trip `trip_id` and run [`generate_itinerary`] for it.
pub async fn generate_for_trip_id(
    pool: &PgPool,
    llm: &dyn ChatCompletion,
    trip_id: i64,
    credentials: &LlmCredentials,
    cancel: &CancellationToken,
) -> Result<Vec<DayPlan>, GenerateError> {
    let trip = trips::get_trip(pool, trip_id)
        .await
        .map_err(GenerateError::Storage)?
        .ok_or(GenerateError::TripNotFound(trip_id))?;

    generate_itinerary(pool, llm, &trip, credentials, cancel).await
}

/// The stored itinerary for `trip_id`, ordered by day number. Empty when none
/// has been generated yet.
pub async fn fetch_itinerary(pool: &PgPool, trip_id: i64) -> Result<Vec<DayPlan>, GenerateError> {
    if trip_id <= 0 {
        return Err(ValidationError::NonPositiveId(trip_id).into());
    }
    day_plans::list_day_plans(pool, trip_id)
        .await
        .with_context(|| format!("failed to load itinerary for trip {trip_id}"))
        .map_err(GenerateError::Storage)
}
