//! Backend request and response shapes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainError;

use super::intent::{SearchIntent, SearchKind};

/// Body of `POST /search`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(rename = "type")]
    pub kind: SearchKind,
    pub models: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl SearchRequest {
    pub fn from_intent(intent: &SearchIntent, top_k: Option<u32>) -> Self {
        Self {
            query: intent.query().to_string(),
            kind: intent.kind(),
            models: intent.models().iter().cloned().collect(),
            top_k,
        }
    }
}

/// Body of `POST /qa`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaRequest {
    pub question: String,
}

/// Response of `GET /stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsResponse {
    pub sentences_count: u64,
    pub words_count: u64,
    pub relationships_count: u64,
    pub models_loaded: u64,
    pub available_models: Vec<String>,
    pub supported_models: BTreeMap<String, String>,
    pub model_details: BTreeMap<String, ModelDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDetails {
    pub words: u64,
    pub sentences: u64,
}

/// Response of `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthResponse {
    pub status: String,
    pub search_system_ready: bool,
    pub relationships_loaded: bool,
    pub timestamp: i64,
    pub data_available: Option<DataAvailability>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataAvailability {
    pub words: bool,
    pub sentences: bool,
}

/// Response of `POST /search`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub query: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub models_used: Vec<String>,
    pub search_results: BTreeMap<String, ModelResults>,
}

/// Result set produced by one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelResults {
    pub model_name: String,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchHit {
    pub rank: u32,
    pub similarity: f64,
    pub similarity_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<BTreeMap<String, Vec<String>>>,
}

impl SearchHit {
    /// The matched sentence or word
    pub fn text(&self) -> &str {
        self.sentence
            .as_deref()
            .or(self.word.as_deref())
            .unwrap_or_default()
    }
}

/// Response of `GET /relationships/{word}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipsResponse {
    pub word: String,
    pub found: Option<bool>,
    pub message: Option<String>,
    pub relationships: BTreeMap<String, Vec<String>>,
}

impl RelationshipsResponse {
    pub fn is_empty(&self) -> bool {
        self.found == Some(false) || self.relationships.values().all(Vec::is_empty)
    }
}

/// Response of `POST /qa`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaResponse {
    pub question: String,
    pub answer: String,
    pub confidence: f64,
    pub method: String,
    pub retrieved_documents: u64,
    pub source_sentences: Vec<String>,
    pub similarity_scores: Vec<f64>,
}

/// Typed view over an opaque result payload
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPayload {
    Search(SearchResponse),
    Relationships(RelationshipsResponse),
    Answer(QaResponse),
}

impl ResultPayload {
    /// Interprets a payload according to the kind that produced it
    pub fn parse(kind: SearchKind, payload: &Value) -> Result<Self, DomainError> {
        let parsed = match kind {
            SearchKind::Sentences | SearchKind::Words => {
                serde_json::from_value(payload.clone()).map(ResultPayload::Search)
            }
            SearchKind::Relationships => {
                serde_json::from_value(payload.clone()).map(ResultPayload::Relationships)
            }
            SearchKind::Qa => serde_json::from_value(payload.clone()).map(ResultPayload::Answer),
        };

        parsed.map_err(|e| {
            DomainError::internal(format!("Unexpected {} payload shape: {}", kind, e))
        })
    }
}

/// Extracts the backend's `{error}` field, if present
pub fn backend_error(payload: &Value) -> Option<String> {
    match payload.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}
