//! In-memory key/value store

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::cache::{KeyValueStore, StoreQuota};
use crate::domain::DomainError;

/// Process-local store; contents vanish when the process exits
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: Mutex<BTreeMap<String, String>>,
    quota: StoreQuota,
}

impl InMemoryStore {
    /// Creates a new in-memory store without a size limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes past `max_bytes`
    pub fn with_quota(max_bytes: usize) -> Self {
        Self::from_quota(StoreQuota::new(Some(max_bytes)))
    }

    pub fn from_quota(quota: StoreQuota) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, DomainError> {
        self.items
            .lock()
            .map_err(|e| DomainError::cache(format!("Store lock poisoned: {}", e)))
    }

    /// Total bytes held by keys and values
    pub fn used_bytes(&self) -> usize {
        self.items
            .lock()
            .map(|items| used_bytes(&items))
            .unwrap_or(0)
    }
}

pub(crate) fn used_bytes(items: &BTreeMap<String, String>) -> usize {
    items.iter().map(|(k, v)| k.len() + v.len()).sum()
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let mut items = self.lock()?;

        let replaced = items.get(key).map(String::len);
        self.quota.check(used_bytes(&items), replaced, key, value)?;

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.lock()?.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
