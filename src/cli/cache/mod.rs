//! Cache command - result cache maintenance

use clap::Subcommand;

use crate::domain::cache::CacheEntry;
use crate::domain::search::{SearchIntent, SearchKind};
use crate::AppContext;

#[derive(Subcommand, Clone)]
pub enum CacheAction {
    /// Remove expired and unreadable entries
    Sweep,

    /// List cached searches
    List,

    /// Remove one cached search
    Evict {
        /// Query text of the cached search
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,

        #[arg(long, short, default_value_t = SearchKind::default())]
        kind: SearchKind,

        #[arg(long = "model", short)]
        models: Vec<String>,
    },

    /// Remove every cached search
    Clear,
}

/// Run a cache maintenance action
pub async fn run(ctx: &AppContext, action: CacheAction) -> anyhow::Result<()> {
    match action {
        CacheAction::Sweep => {
            let report = ctx.cache.sweep().await;
            println!("Kept {} entries, removed {}", report.kept, report.removed);
        }
        CacheAction::List => {
            let entries = ctx.cache.entries().await;

            if entries.is_empty() {
                println!("Cache is empty");
            }

            for entry in &entries {
                println!("{}", format_entry(entry));
            }
        }
        CacheAction::Evict {
            words,
            kind,
            models,
        } => {
            let intent = SearchIntent::new(words.join(" "), kind, models);

            if ctx.cache.evict(&intent).await {
                println!("Removed cached {} search for \"{}\"", kind, intent.query());
            } else {
                println!("No cached {} search for \"{}\"", kind, intent.query());
            }
        }
        CacheAction::Clear => {
            let removed = ctx.cache.clear().await;
            println!("Removed {} entries", removed);
        }
    }

    Ok(())
}

fn format_entry(entry: &CacheEntry) -> String {
    let stored_at = chrono::DateTime::from_timestamp_millis(entry.stored_at_ms)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "?".to_string());

    let models = entry.models.iter().cloned().collect::<Vec<_>>().join(",");

    format!(
        "{}  {:<13}  {:<30}  {}",
        stored_at, entry.kind, models, entry.query
    )
}
