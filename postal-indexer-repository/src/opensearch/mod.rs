//! OpenSearch implementation of the postal store.
//!
//! This module provides a concrete implementation of `PostalStore`
//! using OpenSearch as the backend.

mod client;
mod index_config;
mod queries;

pub use client::OpenSearchStore;
pub use index_config::{IndexConfig, DEFAULT_INDEX_NAME};
