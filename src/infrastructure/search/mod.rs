//! Search infrastructure - HTTP backend

mod http_client;

pub use http_client::{HttpSearchBackend, DEFAULT_TIMEOUT};
