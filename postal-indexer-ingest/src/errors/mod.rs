//! Error types for the postal indexer ingest.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the postal indexer ingest.
///
/// Per-batch store failures are not surfaced through this type: the writer
/// reports them as failed outcomes and the pipeline keeps going.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Invalid ingest configuration (e.g. zero batch capacity).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The source file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The caller supplied invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failed to hand a batch to a write task.
    #[error("Dispatch error: {0}")]
    DispatchError(String),

    /// I/O error while opening the source file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a dispatch error.
    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::DispatchError(msg.into())
    }
}
