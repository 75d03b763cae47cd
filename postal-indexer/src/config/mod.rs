//! Configuration for the postal indexer binary.
//!
//! Everything is read from the environment. `from_lookup` takes the lookup
//! as a closure so parsing can be tested without touching process state.

mod dependencies;
mod logging;

pub use dependencies::Dependencies;
pub use logging::{init_logging, LogFormat};

use std::env;
use std::path::PathBuf;

use postal_indexer_ingest::{IngestConfig, DEFAULT_BATCH_CAPACITY};
use postal_indexer_repository::DEFAULT_INDEX_NAME;

use crate::IndexingError;

/// Default OpenSearch URL.
pub const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Settings for one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// OpenSearch server URL.
    pub opensearch_url: String,
    /// Index receiving the entries.
    pub index_name: String,
    /// Tab-delimited file to import.
    pub import_file: PathBuf,
    /// Batching and concurrency settings.
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Load the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `POSTAL_INDEX_NAME`: index name (default: postal_codes)
    /// - `POSTAL_IMPORT_FILE`: file to import (required)
    /// - `POSTAL_BATCH_SIZE`: entries per bulk request (default: 1024)
    /// - `POSTAL_MAX_IN_FLIGHT`: bound on concurrent writes (default: unbounded)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load the configuration through `lookup`.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let opensearch_url = get("OPENSEARCH_URL").unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string());
        let index_name = get("POSTAL_INDEX_NAME").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string());
        let import_file = get("POSTAL_IMPORT_FILE")
            .map(PathBuf::from)
            .ok_or_else(|| IndexingError::config("POSTAL_IMPORT_FILE is not set"))?;

        let batch_capacity = match get("POSTAL_BATCH_SIZE") {
            Some(value) => parse_positive("POSTAL_BATCH_SIZE", &value)?,
            None => DEFAULT_BATCH_CAPACITY,
        };
        let max_in_flight = get("POSTAL_MAX_IN_FLIGHT")
            .map(|value| parse_positive("POSTAL_MAX_IN_FLIGHT", &value))
            .transpose()?;

        let ingest = IngestConfig {
            batch_capacity,
            max_in_flight,
        };
        ingest.validate()?;

        Ok(Self {
            opensearch_url,
            index_name,
            import_file,
            ingest,
        })
    }
}

fn parse_positive(key: &str, value: &str) -> Result<usize, IndexingError> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(IndexingError::config(format!(
            "{} must be a positive integer, got '{}'",
            key, value
        ))),
    }
}
