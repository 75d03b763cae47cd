//! Pipeline module for the postal indexer ingest.
//!
//! Streams a tab-delimited file through the parser, the batcher and the
//! writer, and reports how many batches made it into the store.
//!
//! The pipeline moves through `Idle -> Streaming -> Draining -> Done`. A
//! missing source file moves it from `Idle` to `Failed` before any line is
//! read or any write is issued.
//!
//! Batch writes run as separate tasks and the reader does not wait for one
//! to finish before reading on. Batches are dispatched in ascending sequence
//! order but may complete in any order. `IngestConfig::max_in_flight` caps
//! the number of writes running at once; without it the only limit is how
//! fast the store accepts them.

mod source;

pub use source::{open_lines, FileLines, LineReader, SourceLine};

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncBufRead;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::batcher::{Batch, Batcher};
use crate::config::IngestConfig;
use crate::errors::IngestError;
use crate::parser::parse_line;
use crate::writer::{BulkWriter, WriteOutcome};

/// Lifecycle state of an ingest pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// Constructed, not yet started.
    Idle,
    /// Reading lines and dispatching full batches.
    Streaming,
    /// Input exhausted; dispatching the last batch and awaiting writes.
    Draining,
    /// Every dispatched write has completed.
    Done,
    /// The source file (held here) did not exist.
    Failed(PathBuf),
}

/// Summary of a completed import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Lines read from the source.
    pub lines_read: usize,
    /// Lines whose invalid UTF-8 was replaced with U+FFFD.
    pub lines_lossy: usize,
    /// Read error that cut the source short. Lines after it were not read.
    pub read_error: Option<String>,
    /// Batches handed to the writer.
    pub batches_dispatched: usize,
    /// Batches fully written.
    pub batches_succeeded: usize,
    /// Batches that failed to write.
    pub batches_failed: usize,
    /// Records handed to the writer.
    pub records_dispatched: usize,
    /// Records written.
    pub records_written: usize,
    /// Records belonging to failed batches.
    pub records_failed: usize,
    /// Sizes of the dispatched batches, in dispatch order.
    pub batch_sizes: Vec<usize>,
    /// Sequence numbers of failed batches, ascending.
    pub failed_batches: Vec<u64>,
}

impl IngestReport {
    /// True only if the whole source was read and every batch was written.
    pub fn is_complete_success(&self) -> bool {
        self.batches_failed == 0 && self.records_failed == 0 && self.read_error.is_none()
    }

    fn record(&mut self, outcome: &WriteOutcome) {
        match outcome {
            WriteOutcome::Written { count, .. } => {
                self.batches_succeeded += 1;
                self.records_written += count;
            }
            WriteOutcome::Failed {
                sequence, records, ..
            } => {
                self.batches_failed += 1;
                self.records_failed += records;
                self.failed_batches.extend(*sequence);
            }
        }
    }

    fn record_lost(&mut self, sequence: u64, records: usize) {
        self.batches_failed += 1;
        self.records_failed += records;
        self.failed_batches.push(sequence);
    }
}

/// Imports one tab-delimited file into the store.
pub struct IngestPipeline {
    path: PathBuf,
    writer: BulkWriter,
    config: IngestConfig,
    state: PipelineState,
}

impl IngestPipeline {
    /// Create a pipeline for the file at `path`.
    ///
    /// Fails with `ConfigurationError` if `config` is invalid.
    pub fn new(
        path: impl Into<PathBuf>,
        writer: BulkWriter,
        config: IngestConfig,
    ) -> Result<Self, IngestError> {
        config.validate()?;

        Ok(Self {
            path: path.into(),
            writer,
            config,
            state: PipelineState::Idle,
        })
    }

    /// The source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Run the import to the end of the file.
    ///
    /// Store failures and read errors do not make this return `Err`; they
    /// are counted in the report. Errors are returned only when the import
    /// cannot start: the file is missing or unreadable, or the pipeline has
    /// already run.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn run(&mut self) -> Result<IngestReport, IngestError> {
        if self.state != PipelineState::Idle {
            return Err(IngestError::invalid_input("The pipeline has already run"));
        }

        let lines = self.open_source().await?;
        self.ingest(lines).await
    }

    /// Stream `lines` through the batcher and writer until they run out.
    async fn ingest<R>(&mut self, mut lines: LineReader<R>) -> Result<IngestReport, IngestError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut batcher = Batcher::new(self.config.batch_capacity)?;
        let mut dispatcher = Dispatcher::new(self.writer.clone(), self.config.max_in_flight);
        let mut report = IngestReport::default();

        self.transition(PipelineState::Streaming);
        debug!(
            capacity = batcher.capacity(),
            max_in_flight = ?self.config.max_in_flight,
            "Streaming source"
        );

        while let Some(line) = lines.next_line().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!(
                        error = %e,
                        line = report.lines_read + 1,
                        "Failed to read line, the rest of the source is not imported"
                    );
                    report.read_error = Some(e.to_string());
                    break;
                }
            };
            report.lines_read += 1;

            if line.lossy {
                warn!(line = report.lines_read, "Replaced invalid UTF-8 in line");
                report.lines_lossy += 1;
            }

            if let Some(batch) = batcher.offer(parse_line(&line.text)) {
                dispatcher.dispatch(batch, &mut report).await?;
            }
        }

        self.transition(PipelineState::Draining);
        if let Some(batch) = batcher.flush() {
            dispatcher.dispatch(batch, &mut report).await?;
        }
        dispatcher.drain(&mut report).await;

        self.transition(PipelineState::Done);
        if report.is_complete_success() {
            info!(
                lines = report.lines_read,
                batches = report.batches_dispatched,
                records = report.records_written,
                "Import finished successfully"
            );
        } else {
            warn!(
                lines = report.lines_read,
                batches = report.batches_dispatched,
                failed_batches = report.batches_failed,
                records_written = report.records_written,
                records_failed = report.records_failed,
                read_error = ?report.read_error,
                "Import finished incomplete"
            );
        }

        Ok(report)
    }

    /// Check that the source exists, then open it.
    async fn open_source(&mut self) -> Result<FileLines, IngestError> {
        let exists = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata.is_file(),
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        if !exists {
            error!("Source file does not exist, nothing was imported");
            self.transition(PipelineState::Failed(self.path.clone()));
            return Err(IngestError::FileNotFound(self.path.clone()));
        }

        open_lines(&self.path).await
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "Pipeline state change");
        self.state = next;
    }
}

/// Spawns batch writes and collects their outcomes.
struct Dispatcher {
    writer: BulkWriter,
    limiter: Option<Arc<Semaphore>>,
    in_flight: JoinSet<WriteOutcome>,
    /// Sequence and size of every batch without an outcome yet.
    unsettled: BTreeMap<u64, usize>,
}

impl Dispatcher {
    fn new(writer: BulkWriter, max_in_flight: Option<usize>) -> Self {
        Self {
            writer,
            limiter: max_in_flight.map(|max| Arc::new(Semaphore::new(max))),
            in_flight: JoinSet::new(),
            unsettled: BTreeMap::new(),
        }
    }

    /// Start writing `batch` without waiting for it to complete.
    ///
    /// Outcomes of writes that already finished are collected first. With a
    /// bound configured, waits for a free slot.
    async fn dispatch(&mut self, batch: Batch, report: &mut IngestReport) -> Result<(), IngestError> {
        self.reap(report);

        let permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| IngestError::dispatch(e.to_string()))?,
            ),
            None => None,
        };

        report.batches_dispatched += 1;
        report.records_dispatched += batch.len();
        report.batch_sizes.push(batch.len());
        self.unsettled.insert(batch.sequence(), batch.len());

        debug!(
            sequence = batch.sequence(),
            size = batch.len(),
            in_flight = self.in_flight.len(),
            "Dispatching batch"
        );

        let writer = self.writer.clone();
        self.in_flight.spawn(
            async move {
                let outcome = writer.write(batch).await;
                drop(permit);
                outcome
            }
            .in_current_span(),
        );

        Ok(())
    }

    /// Collect the outcomes of writes that have already finished.
    fn reap(&mut self, report: &mut IngestReport) {
        while let Some(joined) = self.in_flight.try_join_next() {
            self.settle(joined, report);
        }
    }

    /// Wait for every in-flight write and fold the outcomes into `report`.
    ///
    /// A batch whose task ended without an outcome counts as failed.
    async fn drain(&mut self, report: &mut IngestReport) {
        while let Some(joined) = self.in_flight.join_next().await {
            self.settle(joined, report);
        }

        for (sequence, records) in mem::take(&mut self.unsettled) {
            error!(sequence = sequence, records = records, "Batch write ended without an outcome");
            report.record_lost(sequence, records);
        }

        report.failed_batches.sort_unstable();
    }

    fn settle(&mut self, joined: Result<WriteOutcome, JoinError>, report: &mut IngestReport) {
        match joined {
            Ok(outcome) => {
                if let Some(sequence) = outcome.sequence() {
                    self.unsettled.remove(&sequence);
                }
                report.record(&outcome);
            }
            Err(e) => error!(error = %e, "Batch write task did not complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::source::tests::BrokenReader;
    use super::*;
    use async_trait::async_trait;
    use postal_indexer_repository::{PostalStore, StoreError};
    use postal_indexer_shared::{PostalCodeEntry, SearchQuery, SearchResponse};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::BufReader;

    /// How the mock store answers a bulk insert.
    #[derive(Clone, Copy, PartialEq)]
    enum Ack {
        /// Acknowledge every entry.
        Exact,
        /// Acknowledge one entry more than was sent.
        Overcount,
        /// Panic on the batch whose first postal code is given.
        PanicOn(&'static str),
    }

    /// Mock store counting bulk calls.
    struct MockStore {
        calls: AtomicUsize,
        inserted: AtomicUsize,
        ack: Ack,
    }

    impl MockStore {
        fn new() -> Self {
            Self::acking(Ack::Exact)
        }

        fn acking(ack: Ack) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                inserted: AtomicUsize::new(0),
                ack,
            }
        }
    }

    #[async_trait]
    impl PostalStore for MockStore {
        async fn bulk_insert(&self, entries: &[PostalCodeEntry]) -> Result<usize, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ack::PanicOn(code) = self.ack {
                if entries[0].postal_code == code {
                    panic!("store crashed on batch {}", code);
                }
            }
            self.inserted.fetch_add(entries.len(), Ordering::SeqCst);
            match self.ack {
                Ack::Overcount => Ok(entries.len() + 1),
                _ => Ok(entries.len()),
            }
        }

        async fn insert_one(&self, _entry: &PostalCodeEntry) -> Result<(), StoreError> {
            self.inserted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn search(&self, _query: &SearchQuery) -> Result<SearchResponse, StoreError> {
            Ok(SearchResponse::empty())
        }
    }

    fn pipeline(path: &Path, store: Arc<MockStore>, config: IngestConfig) -> IngestPipeline {
        IngestPipeline::new(path, BulkWriter::new(store), config).unwrap()
    }

    fn numbered_lines(count: usize) -> String {
        (0..count)
            .map(|n| format!("FR\t{:05}\tPlace\tRegion\tRG\tDepartment\n", n))
            .collect()
    }

    fn batch(sequence: u64, size: usize) -> Batch {
        let entries = (0..size)
            .map(|n| PostalCodeEntry::new("FR", format!("{:05}", n), "", "", ""))
            .collect();
        Batch::from_entries(sequence, entries).unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let store = Arc::new(MockStore::new());
        let mut pipeline = pipeline(&path, store.clone(), IngestConfig::default());

        let result = pipeline.run().await;

        assert!(matches!(result, Err(IngestError::FileNotFound(p)) if p == path));
        assert_eq!(pipeline.state(), &PipelineState::Failed(path));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_directory_is_not_a_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockStore::new());
        let mut pipeline = pipeline(dir.path(), store.clone(), IngestConfig::default());

        let result = pipeline.run().await;

        assert!(matches!(result, Err(IngestError::FileNotFound(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_file_reaches_done() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = Arc::new(MockStore::new());
        let mut pipeline = pipeline(file.path(), store.clone(), IngestConfig::default());

        assert_eq!(pipeline.state(), &PipelineState::Idle);
        let report = pipeline.run().await.unwrap();

        assert_eq!(pipeline.state(), &PipelineState::Done);
        assert_eq!(report.lines_read, 0);
        assert_eq!(report.batches_dispatched, 0);
        assert!(report.is_complete_success());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_small_file_is_one_partial_batch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "FR\t75001\tParis\tIle-de-France\t11\tParis").unwrap();
        writeln!(file, "FR\t69001\tLyon").unwrap();
        writeln!(file, "DE\t10115\tBerlin\tBerlin\tBE\tBerlin, Stadt").unwrap();

        let store = Arc::new(MockStore::new());
        let mut pipeline = pipeline(file.path(), store.clone(), IngestConfig::default());
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.lines_read, 3);
        assert_eq!(report.batch_sizes, vec![3]);
        assert_eq!(report.records_written, 3);
        assert_eq!(store.inserted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_pipeline_cannot_run_twice() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = Arc::new(MockStore::new());
        let mut pipeline = pipeline(file.path(), store, IngestConfig::default());

        pipeline.run().await.unwrap();
        let result = pipeline.run().await;

        assert!(matches!(result, Err(IngestError::InvalidInput(_))));
        assert_eq!(pipeline.state(), &PipelineState::Done);
    }

    #[tokio::test]
    async fn test_read_error_marks_the_import_incomplete() {
        let data = numbered_lines(25);
        let reader = BufReader::new(BrokenReader::new(data.as_bytes()));
        let store = Arc::new(MockStore::new());
        let mut pipeline = pipeline(
            Path::new("broken.txt"),
            store.clone(),
            IngestConfig::default().with_batch_capacity(10),
        );

        let report = pipeline.ingest(LineReader::new(reader)).await.unwrap();

        assert_eq!(pipeline.state(), &PipelineState::Done);
        assert_eq!(report.lines_read, 25);
        assert_eq!(report.records_written, 25);
        assert!(report.read_error.is_some());
        assert!(!report.is_complete_success());
    }

    #[tokio::test]
    async fn test_overcounting_store_is_clamped() {
        let data = numbered_lines(25);
        let store = Arc::new(MockStore::acking(Ack::Overcount));
        let mut pipeline = pipeline(
            Path::new("overcount.txt"),
            store,
            IngestConfig::default().with_batch_capacity(10),
        );

        let report = pipeline
            .ingest(LineReader::new(data.as_bytes()))
            .await
            .unwrap();

        assert_eq!(report.records_dispatched, 25);
        assert_eq!(report.records_written, 25);
        assert_eq!(report.records_failed, 0);
        assert!(report.is_complete_success());
    }

    #[tokio::test]
    async fn test_panicked_write_keeps_its_sequence() {
        let data = numbered_lines(30);
        // Batch 1 starts at line 10.
        let store = Arc::new(MockStore::acking(Ack::PanicOn("00010")));
        let mut pipeline = pipeline(
            Path::new("panic.txt"),
            store,
            IngestConfig::default().with_batch_capacity(10),
        );

        let report = pipeline
            .ingest(LineReader::new(data.as_bytes()))
            .await
            .unwrap();

        assert_eq!(report.batches_succeeded, 2);
        assert_eq!(report.batches_failed, 1);
        assert_eq!(report.failed_batches, vec![1]);
        assert_eq!(report.failed_batches.len(), report.batches_failed);
        assert_eq!(report.records_failed, 10);
        assert_eq!(report.records_written, 20);
        assert!(!report.is_complete_success());
    }

    #[tokio::test]
    async fn test_finished_writes_are_reaped_on_dispatch() {
        let store = Arc::new(MockStore::new());
        let mut dispatcher = Dispatcher::new(BulkWriter::new(store), None);
        let mut report = IngestReport::default();

        dispatcher.dispatch(batch(0, 3), &mut report).await.unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        dispatcher.dispatch(batch(1, 3), &mut report).await.unwrap();

        assert_eq!(report.batches_succeeded, 1);
        assert_eq!(dispatcher.in_flight.len(), 1);

        dispatcher.drain(&mut report).await;
        assert_eq!(report.batches_succeeded, 2);
        assert!(dispatcher.unsettled.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected_at_construction() {
        let store = Arc::new(MockStore::new());
        let writer = BulkWriter::new(store);

        let result = IngestPipeline::new(
            "postal.txt",
            writer.clone(),
            IngestConfig::default().with_batch_capacity(0),
        );
        assert!(matches!(result, Err(IngestError::ConfigurationError(_))));

        let result = IngestPipeline::new(
            "postal.txt",
            writer,
            IngestConfig::default().with_max_in_flight(0),
        );
        assert!(matches!(result, Err(IngestError::ConfigurationError(_))));
    }

    #[test]
    fn test_report_records_outcomes() {
        let mut report = IngestReport::default();

        report.record(&WriteOutcome::Written {
            sequence: Some(0),
            count: 10,
        });
        report.record(&WriteOutcome::Failed {
            sequence: Some(1),
            records: 4,
            error: StoreError::bulk_write("boom"),
        });

        assert_eq!(report.batches_succeeded, 1);
        assert_eq!(report.batches_failed, 1);
        assert_eq!(report.records_written, 10);
        assert_eq!(report.records_failed, 4);
        assert_eq!(report.failed_batches, vec![1]);
        assert!(!report.is_complete_success());
    }
}
