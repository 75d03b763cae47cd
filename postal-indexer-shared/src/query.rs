//! Search query construction.
//!
//! A query is built from an arbitrary collection of search terms. Only the
//! values of the terms are used; their keys are opaque and never read.

use thiserror::Error;

/// Maximum number of results returned by a search.
pub const SEARCH_RESULT_LIMIT: usize = 20;

/// Errors that can occur while building a search query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The term collection was empty or absent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl QueryError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// A ranked free-text search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// The free-text query string.
    pub text: String,
    /// Maximum number of results to return.
    pub limit: usize,
}

impl SearchQuery {
    /// Create a query from raw text with the default result limit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: SEARCH_RESULT_LIMIT,
        }
    }
}

/// Build a search query from a collection of `(key, value)` terms.
///
/// The query text is the values joined by a single space, in the order the
/// collection yields them. Fails with [`QueryError::InvalidInput`] when the
/// collection is empty. An absent collection can be passed as
/// `terms.into_iter().flatten()` over an `Option`, which yields nothing and
/// fails the same way.
///
/// # Example
///
/// ```
/// use postal_indexer_shared::build_query;
///
/// let query = build_query([("a", "Paris"), ("b", "75000")]).unwrap();
/// assert_eq!(query.text, "Paris 75000");
/// ```
pub fn build_query<I, K, V>(terms: I) -> Result<SearchQuery, QueryError>
where
    I: IntoIterator<Item = (K, V)>,
    V: AsRef<str>,
{
    let mut values = terms.into_iter().map(|(_, value)| value);

    let first = values
        .next()
        .ok_or_else(|| QueryError::invalid_input("No search terms given"))?;

    let mut text = first.as_ref().to_string();
    for value in values {
        text.push(' ');
        text.push_str(value.as_ref());
    }

    Ok(SearchQuery::new(text))
}
