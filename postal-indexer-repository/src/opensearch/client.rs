//! OpenSearch store implementation.
//!
//! This module provides the concrete implementation of `PostalStore`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, IndexParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::errors::StoreError;
use crate::interfaces::PostalStore;
use crate::opensearch::index_config::IndexConfig;
use crate::opensearch::queries::build_search_query;
use postal_indexer_shared::{PostalCodeEntry, SearchQuery, SearchResponse, SearchResult};

/// OpenSearch store implementation.
///
/// Stores postal code entries as documents with store-assigned ids and
/// ranks them with OpenSearch relevance scoring.
///
/// # Example
///
/// ```ignore
/// use postal_indexer_repository::{IndexConfig, OpenSearchStore, PostalStore};
///
/// let store = OpenSearchStore::new("http://localhost:9200", IndexConfig::default()).await?;
/// store.ensure_index_exists().await?;
/// ```
pub struct OpenSearchStore {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchStore {
    /// Create a new OpenSearch store connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index name and creation settings
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchStore)` - A new store instance
    /// * `Err(StoreError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, StoreError> {
        let parsed_url = Url::parse(url).map_err(|e| StoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, index = %index_config.name, "Created OpenSearch client");

        Ok(Self {
            client,
            index_config,
        })
    }

    /// The index this store reads and writes.
    pub fn index_name(&self) -> &str {
        &self.index_config.name
    }

    /// Parse a search hit into a SearchResult.
    ///
    /// Returns `None` if the hit has no `_source` that decodes as an entry.
    /// A hit without `_score` is scored 0.
    fn parse_hit(hit: &Value) -> Option<SearchResult> {
        let source = hit.get("_source")?;
        let entry: PostalCodeEntry = serde_json::from_value(source.clone()).ok()?;
        let relevance_score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0);

        Some(SearchResult {
            entry,
            relevance_score,
        })
    }

    /// Parse a search response body.
    fn parse_search_response(body: &Value) -> Result<SearchResponse, StoreError> {
        let hits = body
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::parse("Search response has no hits array"))?;

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            match Self::parse_hit(hit) {
                Some(result) => results.push(result),
                None => warn!(hit = %hit, "Skipping search hit that is not a postal code entry"),
            }
        }

        let total = body
            .get("hits")
            .and_then(|h| h.get("total"))
            .and_then(|t| t.get("value").or(Some(t)))
            .and_then(Value::as_u64)
            .unwrap_or(results.len() as u64);

        Ok(SearchResponse { results, total })
    }

    /// Count the items of a bulk response that carry an error.
    fn count_failed_items(body: &Value) -> usize {
        let has_errors = body.get("errors").and_then(Value::as_bool).unwrap_or(false);
        if !has_errors {
            return 0;
        }

        body.get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.get("index").and_then(|i| i.get("error")).is_some())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Serialize an entry into a document body.
    fn to_document(entry: &PostalCodeEntry) -> Result<Value, StoreError> {
        serde_json::to_value(entry).map_err(|e| StoreError::serialization(e.to_string()))
    }
}

#[async_trait]
impl PostalStore for OpenSearchStore {
    /// Insert entries with the `_bulk` API.
    ///
    /// Each entry becomes one `index` action without an `_id`, so the store
    /// assigns ids and duplicates are kept. A response flagged with `errors`
    /// fails the whole call with the number of rejected items.
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn bulk_insert(&self, entries: &[PostalCodeEntry]) -> Result<usize, StoreError> {
        if entries.is_empty() {
            return Err(StoreError::invalid_input("Bulk insert needs at least one entry"));
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(entries.len() * 2);
        for entry in entries {
            body.push(json!({ "index": {} }).into());
            body.push(Self::to_document(entry)?.into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index_config.name))
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::bulk_write(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(StoreError::bulk_write(format!(
                "Bulk insert failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;

        let failed = Self::count_failed_items(&response_body);
        if failed > 0 {
            return Err(StoreError::bulk_write(format!(
                "{} of {} entries failed to index",
                failed,
                entries.len()
            )));
        }

        debug!(count = entries.len(), "Bulk insert completed");
        Ok(entries.len())
    }

    async fn insert_one(&self, entry: &PostalCodeEntry) -> Result<(), StoreError> {
        let response = self
            .client
            .index(IndexParts::Index(&self.index_config.name))
            .body(Self::to_document(entry)?)
            .send()
            .await
            .map_err(|e| StoreError::write(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(StoreError::write(format!(
                "Insert failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(postal_code = %entry.postal_code, "Entry inserted");
        Ok(())
    }

    #[instrument(skip(self, query), fields(query = %query.text))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, StoreError> {
        let body = build_search_query(query);

        let response = self
            .client
            .search(SearchParts::Index(&[self.index_config.name.as_str()]))
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Search request failed");
            return Err(StoreError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;

        Self::parse_search_response(&response_body)
    }

    async fn ensure_index_exists(&self) -> Result<(), StoreError> {
        let name = self.index_config.name.as_str();

        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            debug!(index = %name, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(self.index_config.index_settings())
            .send()
            .await
            .map_err(|e| StoreError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another process may have created it between the two calls.
            if error_body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(StoreError::index_creation(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %name, "Created index");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let health: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;
        let status = health
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        debug!(status = %status, "OpenSearch cluster status");
        Ok(status == "green" || status == "yellow")
    }
}
