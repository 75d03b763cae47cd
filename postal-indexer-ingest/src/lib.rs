//! # Postal Indexer Ingest
//!
//! This crate provides the ingest components for importing tab-delimited
//! postal code files into the store.
//!
//! ## Architecture
//!
//! The ingest follows a Parser-Batcher-Writer pattern:
//!
//! 1. **Parser**: Turns one raw line into a `PostalCodeEntry`
//! 2. **Batcher**: Groups entries into fixed-capacity batches
//! 3. **Writer**: Bulk inserts each batch, isolating per-batch failures
//! 4. **Pipeline**: Streams a file through the three and reports the outcome

pub mod batcher;
pub mod config;
pub mod errors;
pub mod parser;
pub mod pipeline;
pub mod writer;

pub use batcher::{Batch, Batcher};
pub use config::{IngestConfig, DEFAULT_BATCH_CAPACITY};
pub use errors::IngestError;
pub use parser::parse_line;
pub use pipeline::{IngestPipeline, IngestReport, PipelineState};
pub use writer::{BulkWriter, InsertRequest, WriteOutcome};
