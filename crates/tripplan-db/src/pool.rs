//! Connection pool, embedded migrations, and database bootstrap.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/tripplan-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a pool against `config.database_url`.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    debug!(db = ?config.database_name(), "connecting");
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .with_context(|| {
            format!(
                "failed to connect to database {}",
                config.database_name().unwrap_or("<unnamed>")
            )
        })
}

/// Apply any embedded migrations the database has not seen yet.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!(known = MIGRATOR.iter().count(), "migrations up to date");
    Ok(())
}

/// Whether [`ensure_database_exists`] had to create the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    Created,
    AlreadyExisted,
}

/// Create the database named in `config` through the `postgres` maintenance
/// database, unless it already exists.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<Bootstrap> {
    let db_name = config
        .database_name()
        .context("could not determine database name from URL")?;
    let db_name = checked_identifier(db_name)?;

    let maint_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.maintenance_url())
        .await
        .context("failed to connect to maintenance database")?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maint_pool)
            .await
            .context("failed to query pg_database")?;

    let outcome = if exists {
        Bootstrap::AlreadyExisted
    } else {
        maint_pool
            .execute(format!("CREATE DATABASE {db_name}").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        Bootstrap::Created
    };
    info!(db = db_name, ?outcome, "database bootstrap");

    maint_pool.close().await;
    Ok(outcome)
}

/// `CREATE DATABASE` cannot take a bind parameter, so only plain identifiers
/// are accepted.
fn checked_identifier(name: &str) -> Result<&str> {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !plain {
        bail!("database name {name:?} must be a plain identifier (letters, digits, underscore)");
    }
    Ok(name)
}

/// Row counts for the application tables plus the number of applied
/// migrations, for the `db-init` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseSummary {
    pub trips: i64,
    pub day_plans: i64,
    pub migrations_applied: i64,
}

pub async fn database_summary(pool: &PgPool) -> Result<DatabaseSummary> {
    let (trips, day_plans, migrations_applied): (i64, i64, i64) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM trips), \
                (SELECT COUNT(*) FROM day_plans), \
                (SELECT COUNT(*) FROM _sqlx_migrations WHERE success)",
    )
    .fetch_one(pool)
    .await
    .context("failed to summarize database")?;

    Ok(DatabaseSummary {
        trips,
        day_plans,
        migrations_applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_pass() {
        for name in ["tripplan", "tripplan_test_0af3", "_scratch", "Trips2025"] {
            assert_eq!(checked_identifier(name).unwrap(), name);
        }
    }

    #[test]
    fn unsafe_identifiers_are_rejected() {
        for name in ["", "9lives", "trip-plan", "trips; DROP TABLE trips", "tr\u{e9}s"] {
            assert!(checked_identifier(name).is_err(), "{name:?}");
        }
    }

    #[test]
    fn embedded_migrations_cover_both_tables() {
        let descriptions: Vec<String> = MIGRATOR
            .iter()
            .map(|m| m.description.to_string())
            .collect();
        assert_eq!(descriptions, vec!["trips", "day plans"]);
    }
}
