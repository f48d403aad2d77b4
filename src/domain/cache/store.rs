//! Key/value store trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Persistent string key/value storage backing the result cache
///
/// Mirrors the browser storage contract: flat string keys, string values, and
/// writes that may fail when the store is full.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Reads a value
    async fn get_item(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Writes a value, replacing any previous one
    async fn set_item(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Removes a value, returning whether it existed
    async fn remove_item(&self, key: &str) -> Result<bool, DomainError>;

    /// Lists every key currently stored
    async fn keys(&self) -> Result<Vec<String>, DomainError>;
}

/// Byte accounting shared by the store implementations
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreQuota {
    max_bytes: Option<usize>,
}

impl StoreQuota {
    pub fn new(max_bytes: Option<usize>) -> Self {
        Self { max_bytes }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    /// Checks a write of `key`/`value` against the current usage
    ///
    /// `used` is the total size of all stored keys and values, and `replaced`
    /// the size of the value the write would overwrite.
    pub fn check(
        &self,
        used: usize,
        replaced: Option<usize>,
        key: &str,
        value: &str,
    ) -> Result<(), DomainError> {
        let Some(max) = self.max_bytes else {
            return Ok(());
        };

        let freed = replaced.map(|len| len + key.len()).unwrap_or(0);
        let needed = used.saturating_sub(freed) + key.len() + value.len();

        if needed > max {
            return Err(DomainError::cache(format!(
                "Storage quota exceeded: {} bytes needed, {} allowed",
                needed, max
            )));
        }

        Ok(())
    }
}
