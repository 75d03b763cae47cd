//! Search client implementation.
//!
//! This module provides the client application code uses to run ranked
//! free-text searches against the store. It builds queries from search terms
//! and checks that what the store returns honours the ranking contract.

use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::errors::StoreError;
use crate::interfaces::PostalStore;
use postal_indexer_shared::{build_query, SearchQuery, SearchResponse, SEARCH_RESULT_LIMIT};

/// The client for ranked searches over stored postal code entries.
pub struct PostalSearchClient {
    store: Arc<dyn PostalStore>,
}

impl PostalSearchClient {
    /// Create a new search client over a shared store handle.
    pub fn new(store: Arc<dyn PostalStore>) -> Self {
        Self { store }
    }

    /// Query the store.
    /// Input: SearchQuery (query text and a limit of at most 20)
    /// Output: Result<SearchResponse, StoreError> (ordered by descending relevance)
    ///
    /// An empty response is returned, not an error, when nothing matches.
    #[instrument(skip(self, query), fields(query = %query.text, limit = query.limit))]
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, StoreError> {
        if query.limit == 0 || query.limit > SEARCH_RESULT_LIMIT {
            return Err(StoreError::invalid_input(format!(
                "Search limit must be between 1 and {}, got {}",
                SEARCH_RESULT_LIMIT, query.limit
            )));
        }

        let mut response = self.store.search(query).await.map_err(|e| {
            error!(error = %e, "Search failed");
            e
        })?;

        if response.results.len() > query.limit {
            warn!(
                returned = response.results.len(),
                limit = query.limit,
                "Store returned more results than requested, truncating"
            );
            response.results.truncate(query.limit);
        }

        if !response.is_ranked() {
            error!("Store returned results out of relevance order");
            return Err(StoreError::query(
                "Results are not ordered by descending relevance score",
            ));
        }

        debug!(count = response.len(), total = response.total, "Search completed");
        Ok(response)
    }

    /// Build a query from search terms and execute it.
    ///
    /// Only the values of `terms` are used. Fails with
    /// `StoreError::InvalidInput` if `terms` is empty.
    pub async fn search_terms<I, K, V>(&self, terms: I) -> Result<SearchResponse, StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        V: AsRef<str>,
    {
        let query = build_query(terms)?;
        self.search(&query).await
    }
}
