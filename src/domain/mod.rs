//! Domain layer - Core search, cache and dispatch types

pub mod cache;
pub mod dispatch;
pub mod error;
pub mod search;

pub use cache::{CacheEntry, CacheIndex, CacheKey, CacheKeyGenerator, Clock, KeyValueStore};
pub use dispatch::{DispatchState, Renderer, ResultSource, SearchSession, SearchView};
pub use error::{DomainError, ErrorCategory};
pub use search::{SearchBackend, SearchIntent, SearchKind};
