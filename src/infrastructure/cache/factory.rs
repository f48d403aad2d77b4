//! Store factory for runtime selection

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::cache::{KeyValueStore, StoreQuota};
use crate::domain::DomainError;

use super::file::FileStore;
use super::in_memory::InMemoryStore;

/// Supported store types
#[derive(Debug, Clone, PartialEq)]
pub enum StoreType {
    /// Process-local map
    InMemory,
    /// JSON file on disk
    File,
}

impl Default for StoreType {
    fn default() -> Self {
        Self::File
    }
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::InMemory => write!(f, "in_memory"),
            StoreType::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreType::InMemory),
            "file" | "disk" => Ok(StoreType::File),
            _ => Err(DomainError::configuration(format!(
                "Unknown store type: {}. Valid types: in_memory, file",
                s
            ))),
        }
    }
}

/// Configuration for the store factory
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Type of store to create
    pub store_type: StoreType,
    /// File path (required for the file type)
    pub path: Option<PathBuf>,
    /// Byte limit across all keys and values
    pub max_bytes: Option<usize>,
}

impl StoreConfig {
    /// Creates a configuration for an in-memory store
    pub fn in_memory() -> Self {
        Self {
            store_type: StoreType::InMemory,
            ..Default::default()
        }
    }

    /// Creates a configuration for a file store
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            store_type: StoreType::File,
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Sets the byte limit
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }
}

/// Factory for creating store instances
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    /// Creates a new store factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a store instance based on configuration
    pub async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, DomainError> {
        let quota = StoreQuota::new(config.max_bytes);

        match config.store_type {
            StoreType::InMemory => Ok(Arc::new(InMemoryStore::from_quota(quota))),
            StoreType::File => {
                let path = config.path.clone().ok_or_else(|| {
                    DomainError::configuration("A path is required for the file store type")
                })?;

                let store = FileStore::open(path, quota).await?;
                Ok(Arc::new(store))
            }
        }
    }

    /// Creates an unlimited in-memory store
    pub fn create_in_memory(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryStore::new())
    }
}
