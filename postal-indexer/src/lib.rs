//! # Postal Indexer
//!
//! Main library for the postal code indexer.
//!
//! This crate provides the entry point and configuration for running
//! one import of a postal code file into OpenSearch.

pub mod config;

pub use config::{init_logging, AppConfig, Dependencies, LogFormat};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    Ingest(#[from] postal_indexer_ingest::IngestError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] postal_indexer_repository::StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The import finished but not all of the source made it into the store.
    #[error("Import incomplete: {0}")]
    PartialImport(String),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
