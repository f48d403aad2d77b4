//! Search result caching service
//!
//! Entries and the index of live keys are persisted through a
//! [`KeyValueStore`]. Storage failures never reach the caller: reads degrade
//! to a miss and writes to a no-op.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::cache::{
    CacheEntry, CacheIndex, CacheKey, CacheKeyGenerator, Clock, KeyValueStore, SystemClock,
    DEFAULT_NAMESPACE, RESULT_TTL,
};
use crate::domain::search::SearchIntent;
use crate::domain::DomainError;

/// Configuration for result caching
#[derive(Debug, Clone)]
pub struct ResultCacheConfig {
    /// Namespace prefix for storage keys
    pub namespace: String,
    /// Whether to sweep expired entries after every write
    pub sweep_on_put: bool,
}

impl Default for ResultCacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            sweep_on_put: true,
        }
    }
}

impl ResultCacheConfig {
    /// Sets the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Skips the sweep that normally follows a write
    pub fn without_sweep_on_put(mut self) -> Self {
        self.sweep_on_put = false;
        self
    }
}

/// Outcome of an expiry sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries still live
    pub kept: usize,
    /// Index references dropped (expired, missing or corrupt)
    pub removed: usize,
}

/// Why a stored entry could not be used
enum EntryState {
    Live(CacheEntry),
    Missing,
    Expired,
    Corrupt,
    /// The store failed; the entry may still be fine
    Unreadable,
}

/// TTL cache of backend responses keyed by search intent
#[derive(Debug)]
pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    keys: CacheKeyGenerator,
    ttl: Duration,
    config: ResultCacheConfig,
}

impl ResultCache {
    /// Creates a new result cache over the given store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, ResultCacheConfig::default())
    }

    /// Creates a new result cache with custom config
    pub fn with_config(store: Arc<dyn KeyValueStore>, config: ResultCacheConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            keys: CacheKeyGenerator::new(config.namespace.clone()),
            ttl: RESULT_TTL,
            config,
        }
    }

    /// Replaces the clock used for TTL checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generates the storage key for an intent
    pub fn key_for(&self, intent: &SearchIntent) -> CacheKey {
        self.keys.generate(intent)
    }

    /// Returns the cached payload for an intent, if present and fresh
    pub async fn get(&self, intent: &SearchIntent) -> Option<Value> {
        let key = self.key_for(intent);

        match self.read_entry(key.as_str()).await {
            EntryState::Live(entry) => {
                debug!("Result cache hit for {} '{}'", intent.kind(), intent.query());
                Some(entry.payload)
            }
            EntryState::Missing | EntryState::Unreadable => {
                debug!("Result cache miss for {} '{}'", intent.kind(), intent.query());
                None
            }
            EntryState::Expired | EntryState::Corrupt => {
                debug!("Dropping stale cache entry for {} '{}'", intent.kind(), intent.query());
                self.discard(key.as_str()).await;
                None
            }
        }
    }

    /// Stores a payload for an intent; storage failures are logged and ignored
    pub async fn put(&self, intent: &SearchIntent, payload: &Value) {
        if let Err(e) = self.try_put(intent, payload).await {
            warn!("Failed to cache result for '{}': {}", intent.query(), e);
            return;
        }

        if self.config.sweep_on_put {
            self.sweep().await;
        }
    }

    async fn try_put(&self, intent: &SearchIntent, payload: &Value) -> Result<(), DomainError> {
        let key = self.key_for(intent);
        let entry = CacheEntry::new(key.as_str(), intent, payload.clone(), self.clock.now_millis());

        let data = serde_json::to_string(&entry)
            .map_err(|e| DomainError::cache(format!("Failed to serialize cache entry: {}", e)))?;

        self.store.set_item(key.as_str(), &data).await?;

        let mut index = self.read_index().await;

        if index.insert(key.as_str()) {
            self.write_index(&index).await?;
        }

        Ok(())
    }

    /// Removes expired, missing and corrupt entries and rewrites the index
    ///
    /// Keys whose entry cannot be read right now stay indexed.
    pub async fn sweep(&self) -> SweepReport {
        let index = self.read_index().await;
        let mut survivors = CacheIndex::default();
        let mut removed = 0;

        for key in index.keys() {
            match self.read_entry(key).await {
                EntryState::Live(_) | EntryState::Unreadable => {
                    survivors.insert(key.clone());
                }
                EntryState::Missing => removed += 1,
                EntryState::Expired | EntryState::Corrupt => {
                    self.remove_quietly(key).await;
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            debug!("Swept {} stale cache entries, {} kept", removed, survivors.len());

            if let Err(e) = self.write_index(&survivors).await {
                warn!("Failed to rewrite cache index: {}", e);
            }
        }

        SweepReport {
            kept: survivors.len(),
            removed,
        }
    }

    /// Removes the entry for one intent; returns whether it existed
    pub async fn evict(&self, intent: &SearchIntent) -> bool {
        let key = self.key_for(intent);
        let existed = matches!(
            self.store.get_item(key.as_str()).await,
            Ok(Some(_))
        );

        self.discard(key.as_str()).await;
        existed
    }

    /// Removes every key under the cache namespace, orphans included
    pub async fn clear(&self) -> usize {
        let keys = match self.store.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list cache keys: {}", e);
                return 0;
            }
        };

        let index_key = self.keys.index_key();
        let mut removed = 0;

        for key in keys.iter().filter(|k| self.keys.owns(k)) {
            if self.remove_quietly(key).await && *key != index_key {
                removed += 1;
            }
        }

        removed
    }

    /// Lists live entries in index order
    pub async fn entries(&self) -> Vec<CacheEntry> {
        let index = self.read_index().await;
        let mut entries = Vec::with_capacity(index.len());

        for key in index.keys() {
            if let EntryState::Live(entry) = self.read_entry(key).await {
                entries.push(entry);
            }
        }

        entries
    }

    /// Returns the persisted index; unreadable indexes read as empty
    pub async fn index(&self) -> CacheIndex {
        self.read_index().await
    }

    async fn read_entry(&self, key: &str) -> EntryState {
        let data = match self.store.get_item(key).await {
            Ok(Some(data)) => data,
            Ok(None) => return EntryState::Missing,
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", key, e);
                return EntryState::Unreadable;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Corrupt cache entry {}: {}", key, e);
                return EntryState::Corrupt;
            }
        };

        if entry.is_expired(self.clock.now_millis(), self.ttl) {
            EntryState::Expired
        } else {
            EntryState::Live(entry)
        }
    }

    async fn read_index(&self) -> CacheIndex {
        let key = self.keys.index_key();

        match self.store.get_item(&key).await {
            Ok(Some(data)) => serde_json::from_str::<Vec<String>>(&data)
                .map(CacheIndex::new)
                .unwrap_or_else(|e| {
                    warn!("Ignoring corrupt cache index: {}", e);
                    CacheIndex::default()
                }),
            Ok(None) => CacheIndex::default(),
            Err(e) => {
                warn!("Failed to read cache index: {}", e);
                CacheIndex::default()
            }
        }
    }

    async fn write_index(&self, index: &CacheIndex) -> Result<(), DomainError> {
        let data = serde_json::to_string(index)
            .map_err(|e| DomainError::cache(format!("Failed to serialize cache index: {}", e)))?;

        self.store.set_item(&self.keys.index_key(), &data).await
    }

    /// Removes an entry together with its index reference
    async fn discard(&self, key: &str) {
        self.remove_quietly(key).await;

        let mut index = self.read_index().await;

        if index.remove(key) {
            if let Err(e) = self.write_index(&index).await {
                warn!("Failed to update cache index: {}", e);
            }
        }
    }

    async fn remove_quietly(&self, key: &str) -> bool {
        match self.store.remove_item(key).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!("Failed to remove cache key {}: {}", key, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{ManualClock, MockKeyValueStore};
    use crate::domain::search::SearchKind;
    use crate::infrastructure::cache::InMemoryStore;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    fn words_intent(query: &str) -> SearchIntent {
        SearchIntent::new(query, SearchKind::Words, ["dbmdz_bert"])
    }

    fn create_cache() -> (ResultCache, Arc<InMemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(NOW));
        let cache = ResultCache::new(store.clone()).with_clock(clock.clone());
        (cache, store, clock)
    }

    #[tokio::test]
    async fn test_put_then_get_returns_payload() {
        let (cache, _, _) = create_cache();
        let intent = words_intent("kitap");
        let payload = json!({"query": "kitap", "models_used": ["dbmdz_bert"]});

        cache.put(&intent, &payload).await;

        assert_eq!(cache.get(&intent).await, Some(payload));
    }

    #[tokio::test]
    async fn test_get_miss() {
        let (cache, _, _) = create_cache();
        assert!(cache.get(&words_intent("kitap")).await.is_none());
    }

    #[tokio::test]
    async fn test_model_order_shares_entry() {
        let (cache, _, _) = create_cache();
        let a = SearchIntent::new("kitap", SearchKind::Sentences, ["m2", "m1"]);
        let b = SearchIntent::new("kitap", SearchKind::Sentences, ["m1", "m2"]);

        cache.put(&a, &json!({"hit": true})).await;

        assert_eq!(cache.get(&b).await, Some(json!({"hit": true})));
    }

    #[tokio::test]
    async fn test_entry_past_ttl_is_dropped_with_index_reference() {
        let (cache, store, clock) = create_cache();
        let intent = words_intent("kitap");

        clock.set(NOW - RESULT_TTL.as_millis() as i64 - 1);
        cache.put(&intent, &json!({"old": true})).await;
        let key = cache.key_for(&intent);
        assert!(cache.index().await.contains(key.as_str()));

        clock.set(NOW);

        assert!(cache.get(&intent).await.is_none());
        assert!(!cache.index().await.contains(key.as_str()));
        assert!(store.get_item(key.as_str()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entry_just_inside_ttl_is_served() {
        let (cache, _, clock) = create_cache();
        let intent = words_intent("kitap");

        cache.put(&intent, &json!(1)).await;
        clock.advance(RESULT_TTL - Duration::from_millis(1));

        assert_eq!(cache.get(&intent).await, Some(json!(1)));

        clock.advance(Duration::from_millis(1));
        assert!(cache.get(&intent).await.is_none());
    }

    #[tokio::test]
    async fn test_put_appends_key_once() {
        let (cache, _, _) = create_cache();
        let intent = words_intent("kitap");

        cache.put(&intent, &json!(1)).await;
        cache.put(&intent, &json!(2)).await;

        assert_eq!(cache.index().await.len(), 1);
        assert_eq!(cache.get(&intent).await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_sweep_drops_expired_missing_and_corrupt() {
        let (cache, store, clock) = create_cache();
        let generator = CacheKeyGenerator::default();

        cache.put(&words_intent("eski"), &json!("old")).await;
        clock.advance(Duration::from_secs(23 * 60 * 60));
        cache.put(&words_intent("yeni"), &json!("new")).await;
        clock.advance(Duration::from_secs(2 * 60 * 60));

        let corrupt = generator.generate(&words_intent("bozuk"));
        store.set_item(corrupt.as_str(), "{broken").await.unwrap();
        let missing = generator.generate(&words_intent("kayip"));

        let mut index = cache.index().await;
        index.insert(corrupt.as_str());
        index.insert(missing.as_str());
        cache.write_index(&index).await.unwrap();

        let report = cache.sweep().await;

        assert_eq!(report, SweepReport { kept: 1, removed: 3 });
        assert_eq!(cache.index().await.len(), 1);
        assert!(store.get_item(corrupt.as_str()).await.unwrap().is_none());
        assert_eq!(cache.get(&words_intent("yeni")).await, Some(json!("new")));
    }

    #[tokio::test]
    async fn test_put_sweeps_expired_entries() {
        let (cache, _, clock) = create_cache();

        cache.put(&words_intent("eski"), &json!(1)).await;
        clock.advance(RESULT_TTL);
        cache.put(&words_intent("yeni"), &json!(2)).await;

        let index = cache.index().await;
        assert_eq!(index.len(), 1);
        assert!(index.contains(cache.key_for(&words_intent("yeni")).as_str()));
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_miss() {
        let (cache, store, _) = create_cache();
        let intent = words_intent("kitap");

        store
            .set_item(cache.key_for(&intent).as_str(), "not json")
            .await
            .unwrap();

        assert!(cache.get(&intent).await.is_none());
        assert!(store.get_item(cache.key_for(&intent).as_str()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_index_reads_as_empty() {
        let (cache, store, _) = create_cache();
        store.set_item("semsearch:index", "{oops").await.unwrap();

        assert!(cache.index().await.is_empty());

        cache.put(&words_intent("kitap"), &json!(1)).await;
        assert_eq!(cache.index().await.len(), 1);
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_silent() {
        let store = Arc::new(InMemoryStore::with_quota(64));
        let cache = ResultCache::new(store.clone());
        let intent = words_intent("kitap");

        cache.put(&intent, &json!({"big": "x".repeat(500)})).await;

        assert!(cache.get(&intent).await.is_none());
        assert!(cache.index().await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_store_never_surfaces() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_set_item()
            .returning(|_, _| Err(DomainError::cache("QuotaExceededError")));
        store.expect_get_item().returning(|_| Ok(None));
        store.expect_remove_item().returning(|_| Ok(false));
        store.expect_keys().returning(|| Ok(Vec::new()));

        let cache = ResultCache::new(Arc::new(store));
        let intent = words_intent("kitap");

        cache.put(&intent, &json!(1)).await;

        assert!(cache.get(&intent).await.is_none());
    }

    #[tokio::test]
    async fn test_read_errors_degrade_to_miss() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get_item()
            .returning(|_| Err(DomainError::cache("disk unavailable")));

        let cache = ResultCache::new(Arc::new(store));

        assert!(cache.get(&words_intent("kitap")).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_keeps_unreadable_entries_indexed() {
        let mut store = MockKeyValueStore::new();
        store.expect_get_item().returning(|key| {
            if key == "semsearch:index" {
                Ok(Some(r#"["semsearch:entry:abc"]"#.to_string()))
            } else {
                Err(DomainError::cache("disk unavailable"))
            }
        });
        store.expect_set_item().never();
        store.expect_remove_item().never();

        let cache = ResultCache::new(Arc::new(store));

        assert_eq!(cache.sweep().await, SweepReport { kept: 1, removed: 0 });
    }

    #[tokio::test]
    async fn test_evict() {
        let (cache, _, _) = create_cache();
        let intent = words_intent("kitap");

        cache.put(&intent, &json!(1)).await;

        assert!(cache.evict(&intent).await);
        assert!(!cache.evict(&intent).await);
        assert!(cache.get(&intent).await.is_none());
        assert!(cache.index().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_namespace_only() {
        let (cache, store, _) = create_cache();

        cache.put(&words_intent("a"), &json!(1)).await;
        cache.put(&words_intent("b"), &json!(2)).await;
        store.set_item("semsearch:entry:orphan", "{}").await.unwrap();
        store.set_item("unrelated", "keep").await.unwrap();

        let removed = cache.clear().await;

        assert_eq!(removed, 3);
        assert_eq!(store.keys().await.unwrap(), vec!["unrelated"]);
    }

    #[tokio::test]
    async fn test_entries_lists_live_entries() {
        let (cache, _, _) = create_cache();

        cache.put(&words_intent("a"), &json!(1)).await;
        cache
            .put(&SearchIntent::new("b", SearchKind::Qa, ["ignored"]), &json!(2))
            .await;

        let entries = cache.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query, "a");
        assert_eq!(entries[1].kind, SearchKind::Qa);
        assert!(entries[1].models.is_empty());
        assert_eq!(entries[0].stored_at_ms, NOW);
    }

    #[tokio::test]
    async fn test_custom_namespace() {
        let store = Arc::new(InMemoryStore::new());
        let config = ResultCacheConfig::default()
            .with_namespace("other")
            .without_sweep_on_put();
        let cache = ResultCache::with_config(store.clone(), config);

        cache.put(&words_intent("kitap"), &json!(1)).await;

        let keys = store.keys().await.unwrap();
        assert!(keys.iter().all(|k| k.starts_with("other:")));
        assert!(keys.contains(&"other:index".to_string()));
    }
}
