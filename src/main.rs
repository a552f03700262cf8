mod analysis;
mod auth;
mod config;
mod db;
mod error;
mod evaluation;
mod extract;
mod github;
mod llm;
mod prompts;
mod roadmap;
mod stats;
mod web;

#[cfg(test)]
mod test_support;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use crate::auth::SessionStore;
use crate::config::{Config, Secrets};
use crate::db::Database;
use crate::github::GitHubClient;
use crate::llm::ChatClient;
use crate::web::start_server;

#[derive(Parser)]
#[command(name = "repolens")]
#[command(version)]
#[command(about = "AI-assisted reviews of public GitHub repositories")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Start,
    /// Write the effective configuration to the config file
    InitConfig,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub github: GitHubClient,
    pub llm: ChatClient,
    pub sessions: SessionStore,
    /// When repositories were last imported, for display
    pub last_sync: RwLock<Option<String>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Secrets may come from a .env file
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging (RUST_LOG wins over the config file)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli.config.clone().or_else(Config::default_config_path);
    tracing::info!(
        "Config path: {}",
        config_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none, using defaults)".to_string())
    );

    match cli.command.unwrap_or(Commands::Start) {
        Commands::Start => {
            let secrets = Secrets::from_env()?;

            tracing::info!("Data directory: {}", config.data_dir().display());

            // Initialize database
            let db = Database::new(&config.database_path()).await?;
            db.run_migrations().await?;
            tracing::info!("Database initialized");

            let state = Arc::new(AppState {
                db,
                github: GitHubClient::new(&config.github)?,
                llm: ChatClient::new(&config.llm, &secrets.llm_api_key)?,
                sessions: SessionStore::new(&secrets.session_secret, config.web.session_ttl()),
                last_sync: RwLock::new(None),
                config,
            });

            tracing::info!(
                "RepoLens is running at http://{}:{}",
                state.config.web.host,
                state.config.web.port
            );

            start_server(state).await?;
        }
        Commands::InitConfig => {
            config.save(cli.config.as_deref())?;
            tracing::info!("Configuration written");
        }
    }

    Ok(())
}
