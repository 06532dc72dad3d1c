//! Rapport - Personal Relationship Tracker
//!
//! Entry point for the dashboard API server and maintenance commands.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rapport_core::{
    api::{ApiServer, ApiServerConfig},
    config::{RapportConfig, DB_PATH_ENV},
    LibsqlStorage, Tracker,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rapport")]
#[command(about = "Personal relationship tracker with connection-strength scoring", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Set log level (overrides the config file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Database path (overrides RAPPORT_DB_PATH and the config file)
    #[arg(long)]
    db_path: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long, env = "RAPPORT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard HTTP API (default)
    Serve {
        /// Server address (overrides server.addr)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Create the database and run migrations
    Init,

    /// Print overview statistics and weekly activity as JSON
    Stats,
}

fn parse_level(level: &str) -> Level {
    match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn load_config(cli: &Cli, addr: Option<String>) -> anyhow::Result<RapportConfig> {
    let config = match &cli.config {
        Some(path) => RapportConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RapportConfig::default(),
    };

    let config = config.with_overrides(
        cli.db_path.clone(),
        std::env::var(DB_PATH_ENV).ok(),
        addr,
    );
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let addr_override = match &cli.command {
        Some(Commands::Serve { addr }) => addr.clone(),
        _ => None,
    };
    let config = load_config(&cli, addr_override)?;

    // Use the requested level for rapport and request tracing, WARN elsewhere
    let level = parse_level(cli.log_level.as_deref().unwrap_or(&config.log_level));
    let level = level.as_str().to_lowercase();
    let filter = EnvFilter::new(format!(
        "warn,rapport={level},rapport_core={level},tower_http={level}"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Rapport v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Serve { addr: None }) {
        Commands::Serve { .. } => {
            let storage = LibsqlStorage::open_or_create(&config.database.path).await?;
            let tracker = Tracker::new(Arc::new(storage));
            let server = ApiServer::new(
                ApiServerConfig {
                    addr: config.socket_addr()?,
                },
                tracker,
            );

            info!(
                "Serving dashboard API on http://{} (database: {})",
                server.addr(),
                config.database.path.display()
            );
            server.serve().await
        }
        Commands::Init => {
            let storage = LibsqlStorage::open_or_create(&config.database.path).await?;
            println!("Database ready at {}", storage.path().display());
            Ok(())
        }
        Commands::Stats => {
            let storage = LibsqlStorage::open(&config.database.path).await?;
            let tracker = Tracker::new(Arc::new(storage));
            let overview = tracker.overview_stats().await?;
            let weekly = tracker.weekly_activity().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "overview": overview,
                    "weekly": weekly,
                }))?
            );
            Ok(())
        }
    }
}
