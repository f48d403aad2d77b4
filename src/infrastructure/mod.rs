//! Infrastructure layer - Stores, HTTP backend, services and rendering

pub mod cache;
pub mod logging;
pub mod render;
pub mod search;
pub mod services;
