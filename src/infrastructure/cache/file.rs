//! File-backed key/value store
//!
//! The whole store is a single JSON object on disk. Every write rewrites the
//! file through a temporary sibling followed by a rename, so a crash never
//! leaves a half-written store behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::cache::{KeyValueStore, StoreQuota};
use crate::domain::DomainError;

use super::in_memory::used_bytes;

/// Key/value store persisted to a JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
    quota: StoreQuota,
}

impl FileStore {
    /// Opens the store at `path`, creating parent directories as needed
    ///
    /// A missing file starts an empty store; an unreadable or corrupt file is
    /// logged and replaced on the next write.
    pub async fn open(path: impl Into<PathBuf>, quota: StoreQuota) -> Result<Self, DomainError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DomainError::cache(format!(
                        "Failed to create cache directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let items = Self::load(&path).await;
        debug!("Opened file store {} with {} keys", path.display(), items.len());

        Ok(Self {
            path,
            items: Mutex::new(items),
            quota,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(path: &Path) -> BTreeMap<String, String> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&data) {
            Ok(items) => items,
            Err(e) => {
                warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        }
    }

    async fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), DomainError> {
        let data = serde_json::to_string(items)
            .map_err(|e| DomainError::cache(format!("Failed to serialize store: {}", e)))?;

        let tmp = self.path.with_extension("tmp");

        tokio::fs::write(&tmp, data).await.map_err(|e| {
            DomainError::cache(format!("Failed to write {}: {}", tmp.display(), e))
        })?;

        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            DomainError::cache(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let mut items = self.items.lock().await;

        let replaced = items.get(key).map(String::len);
        self.quota.check(used_bytes(&items), replaced, key, value)?;

        let previous = items.insert(key.to_string(), value.to_string());

        if let Err(e) = self.persist(&items).await {
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }

        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<bool, DomainError> {
        let mut items = self.items.lock().await;

        let Some(previous) = items.remove(key) else {
            return Ok(false);
        };

        if let Err(e) = self.persist(&items).await {
            items.insert(key.to_string(), previous);
            return Err(e);
        }

        Ok(true)
    }

    async fn keys(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.items.lock().await.keys().cloned().collect())
    }
}
