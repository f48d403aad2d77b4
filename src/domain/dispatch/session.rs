//! Search session state owned by the dispatcher

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::domain::search::{SearchIntent, SearchKind};

/// Dispatcher lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// Last successful search for one kind
#[derive(Debug, Clone, PartialEq)]
pub struct LastSearch {
    pub intent: SearchIntent,
    pub payload: Value,
}

/// UI-facing state: what the user typed and selected
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    query: String,
    kind: SearchKind,
    models: BTreeSet<String>,
    last_searches: HashMap<SearchKind, LastSearch>,
}

impl SearchSession {
    pub fn new<I, M>(kind: SearchKind, models: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        Self {
            kind,
            models: models.into_iter().map(Into::into).collect(),
            ..Default::default()
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

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_kind(&mut self, kind: SearchKind) {
        self.kind = kind;
    }

    pub fn set_models(&mut self, models: BTreeSet<String>) {
        self.models = models;
    }

    /// Flips a model's selection; returns whether it is now selected
    pub fn toggle_model(&mut self, model: &str) -> bool {
        if self.models.remove(model) {
            false
        } else {
            self.models.insert(model.to_string());
            true
        }
    }

    /// Adopts every field of an explicitly submitted intent
    pub fn adopt(&mut self, intent: &SearchIntent) {
        self.query = intent.query().to_string();
        self.kind = intent.kind();
        self.models = intent.models().clone();
    }

    /// Snapshot of the current state as an intent
    pub fn intent(&self) -> SearchIntent {
        SearchIntent::new(&self.query, self.kind, self.models.iter().cloned())
    }

    pub fn remember(&mut self, intent: &SearchIntent, payload: &Value) {
        self.last_searches.insert(
            intent.kind(),
            LastSearch {
                intent: intent.clone(),
                payload: payload.clone(),
            },
        );
    }

    pub fn last_search(&self, kind: SearchKind) -> Option<&LastSearch> {
        self.last_searches.get(&kind)
    }

    pub fn forget(&mut self, kind: SearchKind) {
        self.last_searches.remove(&kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toggle_model() {
        let mut session = SearchSession::new(SearchKind::Words, ["dbmdz_bert"]);

        assert!(!session.toggle_model("dbmdz_bert"));
        assert!(session.models().is_empty());
        assert!(session.toggle_model("turkcell_roberta"));
        assert!(session.models().contains("turkcell_roberta"));
    }

    #[test]
    fn test_intent_snapshot_trims_query() {
        let mut session = SearchSession::new(SearchKind::Sentences, ["a"]);
        session.set_query("  güzel gün ");

        let intent = session.intent();
        assert_eq!(intent.query(), "güzel gün");
        assert_eq!(intent.kind(), SearchKind::Sentences);
    }

    #[test]
    fn test_memory_is_per_kind() {
        let mut session = SearchSession::default();
        let words = SearchIntent::new("kitap", SearchKind::Words, ["a"]);

        session.remember(&words, &json!({"query": "kitap"}));

        assert_eq!(
            session.last_search(SearchKind::Words).map(|last| &last.intent),
            Some(&words)
        );
        assert!(session.last_search(SearchKind::Sentences).is_none());

        session.forget(SearchKind::Words);
        assert!(session.last_search(SearchKind::Words).is_none());
    }
}
