//! Cache key generation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::domain::search::SearchIntent;

/// Default namespace tag for every key the result cache writes
pub const DEFAULT_NAMESPACE: &str = "semsearch";

/// Storage-safe key identifying one cached search
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives namespaced cache keys from search intents
///
/// The trimmed query, the search kind and the comma-joined sorted models are
/// percent-encoded and joined with `|`, then base64url-encoded so the key stays
/// ASCII-safe whatever the query contains.
#[derive(Debug, Clone)]
pub struct CacheKeyGenerator {
    namespace: String,
}

impl Default for CacheKeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl CacheKeyGenerator {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Prefix shared by every entry key
    pub fn entry_prefix(&self) -> String {
        format!("{}:entry:", self.namespace)
    }

    /// Key holding the persisted index of live entry keys
    pub fn index_key(&self) -> String {
        format!("{}:index", self.namespace)
    }

    /// Whether a raw storage key belongs to this namespace
    pub fn owns(&self, raw_key: &str) -> bool {
        raw_key
            .strip_prefix(&self.namespace)
            .is_some_and(|rest| rest.starts_with(':'))
    }

    pub fn generate(&self, intent: &SearchIntent) -> CacheKey {
        let models = intent
            .effective_models()
            .into_iter()
            .map(|m| urlencoding::encode(m).into_owned())
            .collect::<Vec<_>>()
            .join(",");

        let raw = format!(
            "{}|{}|{}",
            urlencoding::encode(intent.query()),
            intent.kind(),
            models
        );

        CacheKey(format!("{}{}", self.entry_prefix(), URL_SAFE_NO_PAD.encode(raw)))
    }
}
