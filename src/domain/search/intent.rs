//! Search intent and search kinds

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Minimum number of characters before a query is dispatched automatically
pub const MIN_QUERY_CHARS: usize = 2;

/// The kind of search the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    /// Semantic search over sentences
    Sentences,
    /// Semantic search over words
    Words,
    /// Lexical relationship lookup for a single word
    Relationships,
    /// Question answering
    Qa,
}

impl SearchKind {
    pub const ALL: [SearchKind; 4] = [
        SearchKind::Sentences,
        SearchKind::Words,
        SearchKind::Relationships,
        SearchKind::Qa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Sentences => "sentences",
            SearchKind::Words => "words",
            SearchKind::Relationships => "relationships",
            SearchKind::Qa => "qa",
        }
    }

    /// Whether requests of this kind carry the selected model set
    pub fn uses_models(&self) -> bool {
        matches!(self, SearchKind::Sentences | SearchKind::Words)
    }
}

impl Default for SearchKind {
    fn default() -> Self {
        Self::Sentences
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sentences" | "sentence" => Ok(SearchKind::Sentences),
            "words" | "word" => Ok(SearchKind::Words),
            "relationships" | "relations" => Ok(SearchKind::Relationships),
            "qa" | "question" => Ok(SearchKind::Qa),
            _ => Err(DomainError::validation(format!(
                "Unknown search kind: {}. Valid kinds: sentences, words, relationships, qa",
                s
            ))),
        }
    }
}

/// A fully described search the user wants to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIntent {
    query: String,
    kind: SearchKind,
    models: BTreeSet<String>,
}

impl SearchIntent {
    /// Creates an intent; the query is trimmed and models are kept sorted
    pub fn new<I, M>(query: impl AsRef<str>, kind: SearchKind, models: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        Self {
            query: query.as_ref().trim().to_string(),
            kind,
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub fn models(&self) -> &BTreeSet<String> {
        &self.models
    }

    /// Models that influence the request, and therefore the cache key
    pub fn effective_models(&self) -> Vec<&str> {
        if self.kind.uses_models() {
            self.models.iter().map(String::as_str).collect()
        } else {
            Vec::new()
        }
    }

    /// Checks the intent can be dispatched
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.query.is_empty() {
            return Err(DomainError::validation("Please enter a search term"));
        }

        if self.kind.uses_models() && self.models.is_empty() {
            return Err(DomainError::validation("Please select at least one model"));
        }

        Ok(())
    }
}

/// Returns true when the trimmed text is long enough to search automatically
pub fn meets_min_length(text: &str) -> bool {
    text.trim().chars().count() >= MIN_QUERY_CHARS
}
