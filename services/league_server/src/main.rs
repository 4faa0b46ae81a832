use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use league_server::auth::ensure_super_admin;
use league_server::config::{AppConfig, DEFAULT_SESSION_SECRET};
use league_server::export::{export_season, ExportKind};
use league_server::store::{LeagueStore, MemoryStore, PgStore};
use league_server::web::{serve, AppState};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Keep all data in memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },
    /// Write the standings or scorer ranking of a season to CSV
    Export {
        #[arg(short, long)]
        season: i64,
        #[arg(short, long, value_enum, default_value = "standings")]
        kind: ExportKind,
        #[arg(short, long)]
        out: PathBuf,
    },
}

async fn open_store(config: &AppConfig, in_memory: bool) -> Result<Arc<dyn LeagueStore>> {
    if in_memory {
        warn!("Using the in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let url = config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL must be set (or pass --in-memory)")?;
    let store = PgStore::connect(url, config.database.max_connections).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Serve { in_memory } => {
            if config.session.secret == DEFAULT_SESSION_SECRET {
                warn!("SESSION_SECRET is not set; using the development secret");
            }
            let store = open_store(&config, in_memory).await?;
            ensure_super_admin(store.as_ref(), &config.super_admin).await?;
            let state = AppState::new(store, &config);
            serve(state, &config.server).await?;
        }
        Commands::Export { season, kind, out } => {
            let store = open_store(&config, false).await?;
            let rows = export_season(store.as_ref(), season, kind, &out).await?;
            info!("Export finished with {} rows", rows);
        }
    }

    Ok(())
}
