// file: src/backend/mod.rs
// description: search backend operations module exports
// reference: internal module structure

pub mod client;
pub mod index;
pub mod query;

pub use client::{BackendFailure, ElasticClient};
pub use index::{DocumentIndexer, IndexManager, IndexStatus};
pub use query::QueryClient;
