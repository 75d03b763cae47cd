//! Writer module for the postal indexer ingest.
//!
//! Hands batches to the store and turns store failures into outcomes.
//!
//! A failed write loses that batch: it is logged and counted, never retried
//! into consistency and never raised to the caller. Subsequent batches are
//! written as usual. The count a store reports for a batch is never trusted
//! beyond the batch size: more is clamped, less fails the batch.

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::batcher::Batch;
use postal_indexer_repository::{PostalStore, StoreError};
use postal_indexer_shared::PostalCodeEntry;

/// Result of writing one batch or one entry.
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    /// All records were persisted.
    Written {
        /// Batch sequence, `None` for single-entry writes.
        sequence: Option<u64>,
        /// Number of records written.
        count: usize,
    },
    /// Nothing from this write is known to be persisted.
    Failed {
        /// Batch sequence, `None` for single-entry writes.
        sequence: Option<u64>,
        /// Number of records that were submitted.
        records: usize,
        /// The store error.
        error: StoreError,
    },
}

impl WriteOutcome {
    /// Whether the write succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    /// Batch sequence, if this was a batch write.
    pub fn sequence(&self) -> Option<u64> {
        match self {
            Self::Written { sequence, .. } | Self::Failed { sequence, .. } => *sequence,
        }
    }

    /// Number of records written (zero on failure).
    pub fn written(&self) -> usize {
        match self {
            Self::Written { count, .. } => *count,
            Self::Failed { .. } => 0,
        }
    }
}

/// Request for [`BulkWriter::insert`].
#[derive(Debug, Clone)]
pub enum InsertRequest {
    /// Insert one entry.
    One(PostalCodeEntry),
    /// Insert many entries as one batch.
    Many(Vec<PostalCodeEntry>),
}

/// Writer that persists batches into the store.
///
/// Cheap to clone: clones share the same store handle, so a clone can be
/// moved into each write task.
#[derive(Clone)]
pub struct BulkWriter {
    store: Arc<dyn PostalStore>,
}

impl BulkWriter {
    /// Create a new writer with the given store.
    pub fn new(store: Arc<dyn PostalStore>) -> Self {
        Self { store }
    }

    /// Write a batch with a single bulk insert.
    #[instrument(skip(self, batch), fields(sequence = batch.sequence(), size = batch.len()))]
    pub async fn write(&self, batch: Batch) -> WriteOutcome {
        let sequence = Some(batch.sequence());
        let records = batch.len();

        match self.store.bulk_insert(batch.entries()).await {
            Ok(count) if count >= records => {
                if count > records {
                    warn!(
                        acknowledged = count,
                        records = records,
                        "Store acknowledged more entries than were sent"
                    );
                }
                info!(count = records, "Inserted batch of postal code entries");
                WriteOutcome::Written {
                    sequence,
                    count: records,
                }
            }
            Ok(count) => {
                error!(
                    acknowledged = count,
                    records = records,
                    "Store acknowledged only part of the batch, counting it as failed"
                );
                WriteOutcome::Failed {
                    sequence,
                    records,
                    error: StoreError::bulk_write(format!(
                        "Store acknowledged {} of {} entries",
                        count, records
                    )),
                }
            }
            Err(e) => {
                error!(
                    error = %e,
                    records = records,
                    "Failed to insert batch, continuing with remaining batches"
                );
                WriteOutcome::Failed {
                    sequence,
                    records,
                    error: e,
                }
            }
        }
    }

    /// Write a single entry.
    pub async fn write_one(&self, entry: &PostalCodeEntry) -> WriteOutcome {
        match self.store.insert_one(entry).await {
            Ok(()) => {
                debug!(postal_code = %entry.postal_code, "Inserted postal code entry");
                WriteOutcome::Written {
                    sequence: None,
                    count: 1,
                }
            }
            Err(e) => {
                error!(
                    error = %e,
                    postal_code = %entry.postal_code,
                    "Failed to insert postal code entry"
                );
                WriteOutcome::Failed {
                    sequence: None,
                    records: 1,
                    error: e,
                }
            }
        }
    }

    /// Insert one entry or a list of entries.
    ///
    /// `Many` writes the whole list as a single batch. An empty list is
    /// reported as a failed outcome with an `InvalidInput` error.
    pub async fn insert(&self, request: InsertRequest) -> WriteOutcome {
        match request {
            InsertRequest::One(entry) => self.write_one(&entry).await,
            InsertRequest::Many(entries) => match Batch::from_entries(0, entries) {
                Ok(batch) => self.write(batch).await,
                Err(e) => {
                    error!(error = %e, "Rejected bulk insert");
                    WriteOutcome::Failed {
                        sequence: None,
                        records: 0,
                        error: StoreError::invalid_input(e.to_string()),
                    }
                }
            },
        }
    }
}
