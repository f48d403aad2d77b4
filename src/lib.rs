//! Semantic search client
//!
//! A terminal client for a multi-model semantic search API with:
//! - A 24 hour result cache keyed by query, search kind and model selection
//! - Debounced, cancelable dispatch of searches as the user types
//! - Pluggable key/value storage (JSON file or in-memory)

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::debug;

use domain::search::SearchBackend;
use infrastructure::{
    cache::StoreFactory,
    search::HttpSearchBackend,
    services::{ResultCache, ResultCacheConfig, SearchPipeline},
};

/// Collaborators shared by every command
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub backend: Arc<dyn SearchBackend>,
    pub cache: Arc<ResultCache>,
}

impl AppContext {
    pub fn pipeline(&self) -> SearchPipeline {
        SearchPipeline::new(self.cache.clone(), self.backend.clone())
    }
}

/// Builds the backend client and result cache from configuration
pub async fn create_app_context(config: AppConfig) -> anyhow::Result<AppContext> {
    let backend = HttpSearchBackend::with_timeout(&config.api.base_url, config.api.timeout())?
        .with_top_k(config.api.top_k);
    debug!("Search backend at {}", backend.base_url());

    let store_config = config.cache.store_config()?;
    debug!(
        "Result cache store: {} {:?}",
        store_config.store_type, store_config.path
    );
    let store = StoreFactory::new().create(&store_config).await?;

    let cache = ResultCache::with_config(
        store,
        ResultCacheConfig::default().with_namespace(config.cache.namespace.clone()),
    );

    Ok(AppContext {
        config,
        backend: Arc::new(backend),
        cache: Arc::new(cache),
    })
}
