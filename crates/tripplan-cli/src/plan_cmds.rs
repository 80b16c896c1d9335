//! CLI handlers for `tripplan plan` subcommands.
//!
//! Implements:
//! - `tripplan plan generate <trip-id>` -- generate and store an itinerary
//! - `tripplan plan show <trip-id>`     -- print the stored itinerary

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use chrono::Days;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use tripplan_core::GenerateError;
use tripplan_core::itinerary::{fetch_itinerary, generate_itinerary};
use tripplan_core::llm::HttpChatClient;
use tripplan_core::trip::{duration_text, short_range_text};
use tripplan_db::models::{DayPlan, Trip};
use tripplan_db::queries::trips;

use crate::PlanCommands;
use crate::config::TripplanConfig;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(
    command: PlanCommands,
    pool: &PgPool,
    config: &TripplanConfig,
) -> Result<()> {
    match command {
        PlanCommands::Generate { trip_id } => cmd_generate(pool, config, trip_id).await,
        PlanCommands::Show { trip_id } => cmd_show(pool, trip_id).await,
    }
}

async fn load_trip(pool: &PgPool, trip_id: i64) -> Result<Trip> {
    trips::get_trip(pool, trip_id)
        .await?
        .with_context(|| format!("trip {trip_id} not found"))
}

// -----------------------------------------------------------------------
// tripplan plan generate <trip-id>
// -----------------------------------------------------------------------

async fn cmd_generate(pool: &PgPool, config: &TripplanConfig, trip_id: i64) -> Result<()> {
    let trip = load_trip(pool, trip_id).await?;
    let client = HttpChatClient::with_timeout(config.llm_timeout)
        .context("failed to build LLM HTTP client")?;

    // First Ctrl+C cancels, second force-exits.
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let got_first_signal = Arc::new(AtomicBool::new(false));
    let got_first_clone = Arc::clone(&got_first_signal);
    let signal_task = tokio::spawn(async move {
        loop {
            tokio::signal::ctrl_c().await.ok();
            if got_first_clone.swap(true, Ordering::SeqCst) {
                eprintln!("\nForce exit.");
                std::process::exit(130);
            }
            eprintln!("\nCancelling (Ctrl+C again to force)...");
            cancel_clone.cancel();
        }
    });

    println!(
        "Generating a {} itinerary for {}, {}...",
        duration_text(trip.start_date, trip.end_date),
        trip.city,
        trip.country
    );

    let result = generate_itinerary(pool, &client, &trip, &config.credentials, &cancel).await;
    signal_task.abort();

    match result {
        Ok(days) => {
            println!();
            print_itinerary(&trip, &days);
            Ok(())
        }
        Err(err) => {
            if err.is_retryable_by_user() {
                eprintln!("The model's reply was unusable; running the command again may succeed.");
            }
            if matches!(err, GenerateError::Configuration(_)) {
                eprintln!(
                    "Set [llm] endpoint and api_key in {} or the TRIPPLAN_LLM_* env vars.",
                    crate::config::config_path().display()
                );
            }
            Err(err.into())
        }
    }
}

// -----------------------------------------------------------------------
// tripplan plan show <trip-id>
// -----------------------------------------------------------------------

async fn cmd_show(pool: &PgPool, trip_id: i64) -> Result<()> {
    let trip = load_trip(pool, trip_id).await?;
    let days = fetch_itinerary(pool, trip.id).await?;

    if days.is_empty() {
        println!(
            "No itinerary for trip {}. Run `tripplan plan generate {}`.",
            trip.id, trip.id
        );
        return Ok(());
    }

    print_itinerary(&trip, &days);
    Ok(())
}

/// Print `days` under a heading for `trip`.
pub fn print_itinerary(trip: &Trip, days: &[DayPlan]) {
    println!(
        "Itinerary: {}, {} ({})",
        trip.city,
        trip.country,
        short_range_text(trip.start_date, trip.end_date)
    );
    for day in days {
        let date = u64::try_from(day.day_number - 1)
            .ok()
            .and_then(|offset| trip.start_date.checked_add_days(Days::new(offset)))
            .map(|d| d.format(" (%a %b %-d)").to_string())
            .unwrap_or_default();
        println!();
        println!("  Day {}{date}: {}", day.day_number, day.summary);
        println!("    {}", day.description);
    }
}
