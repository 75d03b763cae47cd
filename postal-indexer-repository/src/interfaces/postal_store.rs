//! Postal store trait definition.
//!
//! This module defines the abstract interface for the persistent store that
//! holds postal code entries and ranks them for free-text search.

use async_trait::async_trait;

use crate::errors::StoreError;
use postal_indexer_shared::{PostalCodeEntry, SearchQuery, SearchResponse};

/// Abstract interface for postal code storage and ranked search.
///
/// Implementations can be swapped for different backends (OpenSearch, mock,
/// etc.). A single handle is created at startup and shared, behind an `Arc`,
/// by every writer and search client.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
/// Bulk inserts for different batches may run concurrently.
#[async_trait]
pub trait PostalStore: Send + Sync {
    /// Insert a sequence of entries in a single bulk operation.
    ///
    /// The caller never has to pre-split the slice; any size produced by the
    /// ingest batcher must be accepted.
    ///
    /// # Returns
    ///
    /// * `Ok(count)` - The number of entries written
    /// * `Err(StoreError::BulkWriteError)` - If the bulk operation failed
    async fn bulk_insert(&self, entries: &[PostalCodeEntry]) -> Result<usize, StoreError>;

    /// Insert a single entry.
    async fn insert_one(&self, entry: &PostalCodeEntry) -> Result<(), StoreError>;

    /// Execute a ranked free-text search.
    ///
    /// The store applies `query.limit` and the descending relevance sort as
    /// part of the query itself, not by filtering results afterwards.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - Matches ordered by descending score, possibly empty
    /// * `Err(StoreError::QueryError)` - If the search could not be executed
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, StoreError>;

    /// Ensure the backing index exists with the expected mappings.
    ///
    /// This should be called once during application startup.
    async fn ensure_index_exists(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Check if the store is healthy and reachable.
    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
