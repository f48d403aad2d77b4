//! Search backend trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::DomainError;

use super::intent::{SearchIntent, SearchKind};
use super::response::{HealthResponse, StatsResponse};

/// Operations offered by the semantic search API
///
/// Payloads are returned as opaque JSON so they can be cached verbatim.
/// Implementations map a `{error}` body to [`DomainError::Backend`] and any
/// transport problem to [`DomainError::Network`].
#[async_trait]
pub trait SearchBackend: Send + Sync + Debug {
    /// Fetches corpus and model statistics
    async fn stats(&self) -> Result<StatsResponse, DomainError>;

    /// Fetches backend health
    async fn health(&self) -> Result<HealthResponse, DomainError>;

    /// Multi-model sentence or word search
    async fn search(&self, intent: &SearchIntent) -> Result<Value, DomainError>;

    /// Relationship lookup for a single word
    async fn relationships(&self, word: &str) -> Result<Value, DomainError>;

    /// Question answering
    async fn ask(&self, question: &str) -> Result<Value, DomainError>;

    /// Runs the operation matching the intent's kind
    async fn fetch(&self, intent: &SearchIntent) -> Result<Value, DomainError> {
        match intent.kind() {
            SearchKind::Sentences | SearchKind::Words => self.search(intent).await,
            SearchKind::Relationships => self.relationships(intent.query()).await,
            SearchKind::Qa => self.ask(intent.query()).await,
        }
    }
}
