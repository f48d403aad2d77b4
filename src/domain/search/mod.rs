//! Search domain - intents, backend contract and wire shapes

mod backend;
mod intent;
mod response;

pub use backend::SearchBackend;
pub use intent::{meets_min_length, SearchIntent, SearchKind, MIN_QUERY_CHARS};
pub use response::{
    backend_error, DataAvailability, HealthResponse, ModelDetails, ModelResults, QaRequest,
    QaResponse, RelationshipsResponse, ResultPayload, SearchHit, SearchRequest, SearchResponse,
    StatsResponse,
};

#[cfg(test)]
pub use backend::mock::{MockSearchBackend, RecordedCall};
