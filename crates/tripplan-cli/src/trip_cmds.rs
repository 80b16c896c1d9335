//! CLI handlers for `tripplan trip` subcommands.
//!
//! Implements:
//! - `tripplan trip add ...`       -- create a trip
//! - `tripplan trip list`          -- list all trips
//! - `tripplan trip show <id>`     -- trip details with its itinerary
//! - `tripplan trip delete <id>`   -- delete a trip and its itinerary

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use sqlx::PgPool;

use tripplan_core::itinerary::fetch_itinerary;
use tripplan_core::trip::{duration_text, short_range_text};
use tripplan_db::models::{NewTrip, Trip};
use tripplan_db::queries::{day_plans, trips};

use crate::TripCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `TripCommands` variant to the appropriate handler.
pub async fn run_trip_command(command: TripCommands, pool: &PgPool) -> Result<()> {
    match command {
        TripCommands::Add {
            title,
            city,
            country,
            start,
            end,
            notes,
        } => {
            let new = build_new_trip(title, city, country, &start, &end, notes)?;
            cmd_add(pool, &new).await
        }
        TripCommands::List => cmd_list(pool).await,
        TripCommands::Show { trip_id } => cmd_show(pool, trip_id).await,
        TripCommands::Delete { trip_id } => cmd_delete(pool, trip_id).await,
    }
}

// -----------------------------------------------------------------------
// tripplan trip add
// -----------------------------------------------------------------------

fn parse_date(flag: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("--{flag} must be a YYYY-MM-DD date, got {value:?}"))
}

/// Check the arguments of `trip add` before anything touches the database.
fn build_new_trip(
    title: String,
    city: String,
    country: String,
    start: &str,
    end: &str,
    notes: Option<String>,
) -> Result<NewTrip> {
    let start_date = parse_date("start", start)?;
    let end_date = parse_date("end", end)?;
    if end_date < start_date {
        bail!("--end ({end_date}) is before --start ({start_date})");
    }
    for (flag, value) in [("title", &title), ("city", &city), ("country", &country)] {
        if value.trim().is_empty() {
            bail!("--{flag} must not be empty");
        }
    }

    Ok(NewTrip {
        title,
        city,
        country,
        start_date,
        end_date,
        notes: notes.filter(|n| !n.trim().is_empty()),
    })
}

async fn cmd_add(pool: &PgPool, new: &NewTrip) -> Result<()> {
    let trip = trips::insert_trip(pool, new).await?;

    println!("Trip created.");
    println!();
    println!("  Trip ID:  {}", trip.id);
    println!("  Title:    {}", trip.title);
    println!("  Where:    {}, {}", trip.city, trip.country);
    println!(
        "  When:     {} ({})",
        short_range_text(trip.start_date, trip.end_date),
        duration_text(trip.start_date, trip.end_date)
    );
    println!();
    println!("Next: run `tripplan plan generate {}` to build an itinerary.", trip.id);

    Ok(())
}

// -----------------------------------------------------------------------
// tripplan trip list
// -----------------------------------------------------------------------

async fn cmd_list(pool: &PgPool) -> Result<()> {
    let all = trips::list_trips(pool).await?;

    if all.is_empty() {
        println!("No trips found. Use `tripplan trip add` to create one.");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(all.len());
    for trip in &all {
        let planned = day_plans::count_day_plans(pool, trip.id).await?;
        rows.push(format_row(trip, planned));
    }

    let id_w = rows.iter().map(|r| r[0].len()).max().unwrap_or(2).max(2);
    let title_w = rows.iter().map(|r| r[1].len()).max().unwrap_or(5).max(5);
    let where_w = rows.iter().map(|r| r[2].len()).max().unwrap_or(5).max(5);
    let when_w = rows
        .iter()
        .map(|r| r[3].chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "{:<id_w$}  {:<title_w$}  {:<where_w$}  {:<when_w$}  PLANNED",
        "ID", "TITLE", "WHERE", "WHEN"
    );
    for row in &rows {
        println!(
            "{:<id_w$}  {:<title_w$}  {:<where_w$}  {:<when_w$}  {}",
            row[0], row[1], row[2], row[3], row[4]
        );
    }

    Ok(())
}

fn format_row(trip: &Trip, planned: i64) -> [String; 5] {
    [
        trip.id.to_string(),
        trip.title.clone(),
        format!("{}, {}", trip.city, trip.country),
        short_range_text(trip.start_date, trip.end_date),
        format!(
            "{planned}/{}",
            duration_text(trip.start_date, trip.end_date)
        ),
    ]
}

// -----------------------------------------------------------------------
// tripplan trip show <id>
// -----------------------------------------------------------------------

async fn cmd_show(pool: &PgPool, trip_id: i64) -> Result<()> {
    let trip = trips::get_trip(pool, trip_id)
        .await?
        .with_context(|| format!("trip {trip_id} not found"))?;

    println!("Trip: {} ({})", trip.title, trip.id);
    println!("Where: {}, {}", trip.city, trip.country);
    println!(
        "When: {} ({})",
        short_range_text(trip.start_date, trip.end_date),
        duration_text(trip.start_date, trip.end_date)
    );
    if let Some(notes) = &trip.notes {
        println!("Notes: {notes}");
    }
    println!();

    let days = fetch_itinerary(pool, trip.id).await?;
    if days.is_empty() {
        println!("No itinerary yet. Run `tripplan plan generate {}`.", trip.id);
        return Ok(());
    }
    crate::plan_cmds::print_itinerary(&trip, &days);

    Ok(())
}

// -----------------------------------------------------------------------
// tripplan trip delete <id>
// -----------------------------------------------------------------------

async fn cmd_delete(pool: &PgPool, trip_id: i64) -> Result<()> {
    if !trips::delete_trip(pool, trip_id).await? {
        bail!("trip {trip_id} not found");
    }
    println!("Trip {trip_id} deleted.");
    Ok(())
}
