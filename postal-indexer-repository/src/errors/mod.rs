//! Error types for the postal indexer repository.

mod store_error;

pub use store_error::StoreError;
