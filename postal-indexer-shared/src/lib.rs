//! # Postal Indexer Shared
//!
//! Shared types and data structures for the postal indexer system: the
//! postal code record that flows through ingestion, and the query and
//! response types used by search.

mod entry;
mod query;
mod response;

pub use entry::PostalCodeEntry;
pub use query::{build_query, QueryError, SearchQuery, SEARCH_RESULT_LIMIT};
pub use response::{SearchResponse, SearchResult};
