//! CLI module for the semantic search client
//!
//! Provides subcommands for querying the search backend:
//! - `stats` / `health`: backend status
//! - `search`: one-shot search through the result cache
//! - `interactive`: line-based session with debounced dispatch
//! - `cache`: result cache maintenance

pub mod cache;
pub mod info;
pub mod interactive;
pub mod search;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::domain::search::SearchBackend;
use crate::infrastructure::logging;

/// Semantic search client with a local result cache
#[derive(Parser)]
#[command(name = "semsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Search API base URL (overrides config)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print corpus and model statistics
    Stats,

    /// Print backend health
    Health,

    /// Run a single search
    Search(search::SearchArgs),

    /// Start an interactive search session
    Interactive(interactive::InteractiveArgs),

    /// Inspect or maintain the result cache
    Cache {
        #[command(subcommand)]
        action: cache::CacheAction,
    },
}

/// Loads `.env` and layered configuration, then starts logging
pub fn load_config(base_url: Option<String>) -> AppConfig {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().unwrap_or_default();

    if let Some(base_url) = base_url {
        config.api.base_url = base_url;
    }

    logging::init_logging(&logging::LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.clone(),
    });

    config
}

/// Models to start with: configured ones, else the first the backend offers
pub async fn initial_models(
    configured: &[String],
    backend: &dyn SearchBackend,
) -> Vec<String> {
    if !configured.is_empty() {
        return configured.to_vec();
    }

    match backend.stats().await {
        Ok(stats) => stats.available_models.into_iter().take(1).collect(),
        Err(e) => {
            tracing::warn!("Could not load available models: {}", e);
            Vec::new()
        }
    }
}
