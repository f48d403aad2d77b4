//! Validate → cache lookup → fetch → cache fill

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::dispatch::{FailureView, Renderer, ResultSource, SearchView};
use crate::domain::search::{SearchBackend, SearchIntent};
use crate::domain::DomainError;

use super::result_cache_service::ResultCache;

/// The search steps shared by the dispatcher and one-shot searches
#[derive(Debug, Clone)]
pub struct SearchPipeline {
    cache: Arc<ResultCache>,
    backend: Arc<dyn SearchBackend>,
}

impl SearchPipeline {
    pub fn new(cache: Arc<ResultCache>, backend: Arc<dyn SearchBackend>) -> Self {
        Self { cache, backend }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Validates the intent and consults the cache
    ///
    /// Returns the view to show when no request is needed: a prompt for an
    /// invalid intent or cached results. `None` means the backend must be
    /// asked.
    pub async fn lookup(&self, intent: &SearchIntent) -> Option<SearchView> {
        if let Err(e) = intent.validate() {
            return Some(SearchView::Prompt {
                message: e.message().to_string(),
            });
        }

        let payload = self.cache.get(intent).await?;

        Some(SearchView::Results {
            intent: intent.clone(),
            payload,
            source: ResultSource::Cache,
        })
    }

    /// Performs the backend call for the intent's kind
    pub async fn fetch(&self, intent: &SearchIntent) -> Result<Value, DomainError> {
        info!("Searching {} for '{}'", intent.kind(), intent.query());
        self.backend.fetch(intent).await
    }

    /// Turns a backend outcome into the view to show
    pub fn settle(intent: &SearchIntent, result: Result<Value, DomainError>) -> SearchView {
        match result {
            Ok(payload) => SearchView::Results {
                intent: intent.clone(),
                payload,
                source: ResultSource::Network,
            },
            Err(e) => {
                warn!("Search for '{}' failed: {}", intent.query(), e);
                SearchView::Failed(FailureView::from_error(intent.kind(), &e))
            }
        }
    }

    /// Caches a successful payload
    pub async fn store(&self, intent: &SearchIntent, payload: &Value) {
        self.cache.put(intent, payload).await;
    }

    /// Runs one search to completion, rendering each step
    ///
    /// Returns the final view. Nothing is cached unless the backend call
    /// succeeds.
    pub async fn run(&self, intent: &SearchIntent, renderer: &dyn Renderer) -> SearchView {
        if let Some(view) = self.lookup(intent).await {
            renderer.render(&view);
            return view;
        }

        renderer.render(&SearchView::Loading {
            intent: intent.clone(),
        });

        let view = Self::settle(intent, self.fetch(intent).await);
        renderer.render(&view);

        if let SearchView::Results { payload, .. } = &view {
            self.store(intent, payload).await;
        }

        view
    }
}
