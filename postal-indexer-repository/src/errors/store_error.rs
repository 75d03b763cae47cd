//! Store error types.
//!
//! This module defines the error types that can occur during store operations.

use postal_indexer_shared::QueryError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Failed to establish connection to the store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to insert a single entry.
    #[error("Write error: {0}")]
    WriteError(String),

    /// Bulk insert had failures.
    #[error("Bulk write error: {0}")]
    BulkWriteError(String),

    /// Search query execution failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Failed to parse a response from the store.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the store.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The caller supplied invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failed to create the index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::WriteError(msg.into())
    }

    /// Create a bulk write error.
    pub fn bulk_write(msg: impl Into<String>) -> Self {
        Self::BulkWriteError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }
}

impl From<QueryError> for StoreError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidInput(msg) => Self::InvalidInput(msg),
        }
    }
}
