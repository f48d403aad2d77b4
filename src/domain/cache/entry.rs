//! Cached search entries

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::search::{SearchIntent, SearchKind};

/// Lifetime of a cached search result
pub const RESULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// One persisted search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Storage key of this entry
    pub key: String,
    /// Query text the payload answers
    pub query: String,
    /// Search kind that produced the payload
    pub kind: SearchKind,
    /// Models that took part in the search
    #[serde(default)]
    pub models: BTreeSet<String>,
    /// Backend response, stored verbatim
    pub payload: Value,
    /// Unix timestamp (millis) when the entry was written
    pub stored_at_ms: i64,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, intent: &SearchIntent, payload: Value, now_ms: i64) -> Self {
        Self {
            key: key.into(),
            query: intent.query().to_string(),
            kind: intent.kind(),
            models: intent
                .effective_models()
                .into_iter()
                .map(str::to_string)
                .collect(),
            payload,
            stored_at_ms: now_ms,
        }
    }

    /// Age of the entry at `now_ms`; entries from the future count as fresh
    pub fn age(&self, now_ms: i64) -> Duration {
        let elapsed = now_ms.saturating_sub(self.stored_at_ms).max(0);
        Duration::from_millis(elapsed as u64)
    }

    pub fn is_expired(&self, now_ms: i64, ttl: Duration) -> bool {
        self.age(now_ms) >= ttl
    }
}

/// Ordered set of live entry keys, persisted as a JSON array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheIndex {
    keys: Vec<String>,
}

impl CacheIndex {
    pub fn new(keys: Vec<String>) -> Self {
        let mut index = Self::default();

        for key in keys {
            index.insert(key);
        }

        index
    }

    /// Appends a key if absent; returns whether it was added
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();

        if self.contains(&key) {
            return false;
        }

        self.keys.push(key);
        true
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        self.keys.len() != before
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
