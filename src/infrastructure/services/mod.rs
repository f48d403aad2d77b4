//! Infrastructure services

mod result_cache_service;
mod search_dispatcher;
mod search_pipeline;

pub use result_cache_service::{ResultCache, ResultCacheConfig, SweepReport};
pub use search_dispatcher::{DispatcherHandle, SearchDispatcher, DEBOUNCE_WINDOW};
pub use search_pipeline::SearchPipeline;
