//! What the dispatcher asks the UI to show

use std::fmt::Debug;

use serde_json::Value;

use crate::domain::error::ErrorCategory;
use crate::domain::search::{SearchIntent, SearchKind};
use crate::domain::DomainError;

/// Where a rendered result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    /// Fresh network response
    Network,
    /// Persistent result cache
    Cache,
    /// Per-kind in-memory last search
    Memory,
}

/// A failed search, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureView {
    pub kind: SearchKind,
    pub category: ErrorCategory,
    pub message: String,
}

impl FailureView {
    pub fn from_error(kind: SearchKind, error: &DomainError) -> Self {
        Self {
            kind,
            category: error.category(),
            message: error.message().to_string(),
        }
    }
}

/// A state of the result area
#[derive(Debug, Clone, PartialEq)]
pub enum SearchView {
    /// A request is in flight
    Loading { intent: SearchIntent },
    /// Results are available
    Results {
        intent: SearchIntent,
        payload: Value,
        source: ResultSource,
    },
    /// The result area was emptied
    Cleared,
    /// The intent was rejected before any request; the user must fix it
    Prompt { message: String },
    /// The request failed
    Failed(FailureView),
}

impl SearchView {
    /// Whether this view ends a pipeline run
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchView::Loading { .. })
    }
}

/// Consumer of dispatcher output
pub trait Renderer: Send + Sync + Debug {
    fn render(&self, view: &SearchView);
}
