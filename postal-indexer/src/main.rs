//! Postal indexer entry point.
//!
//! Imports the file named by `POSTAL_IMPORT_FILE` into OpenSearch and exits.

use postal_indexer::{init_logging, AppConfig, Dependencies, IndexingError, LogFormat};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    dotenv::dotenv().ok();
    init_logging(LogFormat::from_env());

    if let Err(e) = run().await {
        error!(error = %e, "Postal indexer failed");
        return Err(e);
    }

    Ok(())
}

async fn run() -> Result<(), IndexingError> {
    let config = AppConfig::from_env()?;
    let mut dependencies = Dependencies::new(&config).await?;

    info!(path = %dependencies.pipeline.path().display(), "Starting import");
    let report = dependencies.pipeline.run().await?;

    info!(
        lines = report.lines_read,
        batches = report.batches_dispatched,
        records_written = report.records_written,
        records_failed = report.records_failed,
        lines_lossy = report.lines_lossy,
        "Import complete"
    );

    if let Some(read_error) = &report.read_error {
        return Err(IndexingError::PartialImport(format!(
            "reading stopped after {} lines: {}",
            report.lines_read, read_error
        )));
    }
    if !report.is_complete_success() {
        return Err(IndexingError::PartialImport(format!(
            "{} of {} batches failed ({} records)",
            report.batches_failed, report.batches_dispatched, report.records_failed
        )));
    }

    Ok(())
}
