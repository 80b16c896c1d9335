mod config;
mod plan_cmds;
mod serve_cmd;
mod trip_cmds;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use tripplan_core::llm::HttpChatClient;
use tripplan_db::config::DbConfig;
use tripplan_db::pool;

use config::TripplanConfig;

#[derive(Parser)]
#[command(name = "tripplan", about = "Trip planner with LLM-generated day-by-day itineraries")]
struct Cli {
    /// Database URL (overrides TRIPPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a tripplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Chat-completions endpoint, e.g. https://my-resource.openai.azure.com
        #[arg(long)]
        llm_endpoint: Option<String>,
        /// Model id or Azure deployment name
        #[arg(long)]
        llm_model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the tripplan database (requires config file or env vars)
    DbInit,
    /// Trip management
    Trip {
        #[command(subcommand)]
        command: TripCommands,
    },
    /// Itinerary generation and display
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Serve the JSON API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum TripCommands {
    /// Create a trip
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        country: String,
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Last day (inclusive), YYYY-MM-DD
        #[arg(long)]
        end: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List all trips
    List,
    /// Show a trip and its itinerary
    Show {
        /// Trip ID
        trip_id: i64,
    },
    /// Delete a trip and its itinerary
    Delete {
        /// Trip ID
        trip_id: i64,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate (or regenerate) a trip's itinerary; Ctrl+C cancels
    Generate {
        /// Trip ID
        trip_id: i64,
    },
    /// Print a trip's stored itinerary
    Show {
        /// Trip ID
        trip_id: i64,
    },
}

/// Execute the `tripplan init` command: write config file.
fn cmd_init(
    db_url: &str,
    llm_endpoint: Option<String>,
    llm_model: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        llm: config::LlmSection {
            endpoint: llm_endpoint,
            model: llm_model,
            ..Default::default()
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    if let Some(endpoint) = &cfg.llm.endpoint {
        println!("  llm.endpoint = {endpoint}");
    }
    if let Some(model) = &cfg.llm.model {
        println!("  llm.model = {model}");
    }
    println!();
    println!(
        "Add `api_key` under [llm] in that file (or set {}) before generating itineraries.",
        config::ENV_LLM_API_KEY
    );
    println!("Next: run `tripplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `tripplan db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = TripplanConfig::resolve(cli_db_url)?;

    println!("Initializing tripplan database...");

    match pool::ensure_database_exists(&resolved.db_config).await? {
        pool::Bootstrap::Created => println!("  created database"),
        pool::Bootstrap::AlreadyExisted => println!("  database already exists"),
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let result = async {
        pool::run_migrations(&db_pool).await?;
        pool::database_summary(&db_pool).await
    }
    .await;
    db_pool.close().await;
    let summary = result?;

    println!("Database ready.");
    println!("  migrations applied: {}", summary.migrations_applied);
    println!("  trips:              {}", summary.trips);
    println!("  day plans:          {}", summary.day_plans);

    println!("tripplan db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            llm_endpoint,
            llm_model,
            force,
        } => {
            cmd_init(&db_url, llm_endpoint, llm_model, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Trip { command } => {
            let resolved = TripplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = trip_cmds::run_trip_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = TripplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool, &resolved).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved = TripplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let client = HttpChatClient::with_timeout(resolved.llm_timeout)
                .context("failed to build LLM HTTP client")?;
            let state = serve_cmd::AppState {
                pool: db_pool.clone(),
                llm: Arc::new(client),
                credentials: Arc::new(resolved.credentials),
                shutdown: CancellationToken::new(),
            };
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
