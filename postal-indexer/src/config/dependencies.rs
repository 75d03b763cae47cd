//! Dependency initialization and wiring for the postal indexer.

use std::sync::Arc;
use tracing::info;

use crate::config::AppConfig;
use crate::IndexingError;
use postal_indexer_ingest::{BulkWriter, IngestPipeline};
use postal_indexer_repository::{
    IndexConfig, OpenSearchStore, PostalSearchClient, PostalStore,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The pipeline importing the configured file.
    pub pipeline: IngestPipeline,
    /// Search client sharing the pipeline's store.
    ///
    /// For library callers that query the imported index; the binary only
    /// runs the import.
    pub search_client: PostalSearchClient,
}

impl Dependencies {
    /// Connect to OpenSearch and wire the pipeline and search client.
    ///
    /// The store is created once here and shared by everything that needs
    /// it. Fails if the cluster is unreachable or unhealthy, or if the
    /// index cannot be created.
    pub async fn new(config: &AppConfig) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %config.opensearch_url,
            index = %config.index_name,
            import_file = %config.import_file.display(),
            batch_size = config.ingest.batch_capacity,
            max_in_flight = ?config.ingest.max_in_flight,
            "Initializing dependencies"
        );

        let store = OpenSearchStore::new(&config.opensearch_url, IndexConfig::new(&config.index_name))
            .await
            .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        let healthy = store
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        store.ensure_index_exists().await?;

        let store: Arc<dyn PostalStore> = Arc::new(store);
        let writer = BulkWriter::new(store.clone());
        let search_client = PostalSearchClient::new(store);
        let pipeline = IngestPipeline::new(&config.import_file, writer, config.ingest.clone())?;

        Ok(Self {
            pipeline,
            search_client,
        })
    }
}
