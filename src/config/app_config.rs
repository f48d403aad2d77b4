use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::cache::DEFAULT_NAMESPACE;
use crate::domain::search::SearchKind;
use crate::infrastructure::cache::{StoreConfig, StoreType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

/// Search backend connection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Results per model; the server picks when unset
    pub top_k: Option<u32>,
}

/// Result cache storage
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `file` or `in_memory`
    pub store: String,
    /// Cache file; defaults to the user cache directory
    pub path: Option<PathBuf>,
    pub namespace: String,
    /// Storage quota across all keys and values
    pub max_bytes: Option<usize>,
}

/// Initial search filters and presentation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_kind: SearchKind,
    /// Selected models at startup; empty selects the first available model
    pub default_models: Vec<String>,
    /// Model id to label
    pub display_names: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 30,
            top_k: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store: StoreType::File.to_string(),
            path: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            max_bytes: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let display_names = [
            ("dbmdz_bert", "BERT Turkish"),
            ("turkcell_roberta", "Turkcell RoBERTa"),
            ("multilingual_mpnet", "Multilingual MPNet"),
        ]
        .into_iter()
        .map(|(id, label)| (id.to_string(), label.to_string()))
        .collect();

        Self {
            default_kind: SearchKind::default(),
            default_models: Vec::new(),
            display_names,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CacheConfig {
    /// Where the file store lives when no path is configured
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("semsearch")
            .join("results.json")
    }

    /// Translates this section into a store factory configuration
    pub fn store_config(&self) -> Result<StoreConfig, crate::domain::DomainError> {
        let store_type: StoreType = self.store.parse()?;

        let mut config = match store_type {
            StoreType::InMemory => StoreConfig::in_memory(),
            StoreType::File => {
                StoreConfig::file(self.path.clone().unwrap_or_else(Self::default_path))
            }
        };

        if let Some(max_bytes) = self.max_bytes {
            config = config.with_max_bytes(max_bytes);
        }

        Ok(config)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("SEMSEARCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
