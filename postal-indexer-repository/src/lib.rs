//! # Postal Indexer Repository
//!
//! This crate provides the store abstraction used by ingestion and search.
//! It includes definitions for errors, the `PostalStore` interface, the
//! search client that enforces the ranking contract, and a concrete store
//! implementation for OpenSearch.

pub mod client;
pub mod errors;
pub mod interfaces;
pub mod opensearch;

pub use client::PostalSearchClient;
pub use errors::StoreError;
pub use interfaces::PostalStore;
pub use opensearch::{IndexConfig, OpenSearchStore, DEFAULT_INDEX_NAME};
