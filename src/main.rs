use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use creel::cli::Cli;
use creel::commands::{dispatch, AppState};
use creel::config::Config;
use creel::session::Session;
use creel::storage::Database;

/// Get the config directory path (~/.config/creel/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("creel"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    let config =
        Config::load(&config_dir.join("config.toml")).context("Failed to load configuration")?;

    let session_path = config_dir.join("session.json");
    let session = Session::load(&session_path).context("Failed to load session")?;

    let db_path = config.database_path(&config_dir);
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = Database::open(db_path_str)
        .await
        .context("Failed to open database")?;

    // One shared client carries the identifying User-Agent and the request
    // deadline for every feed fetch.
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.fetch_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let mut state = AppState {
        db,
        client,
        session,
        session_path,
    };

    if let Err(e) = dispatch(&mut state, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
