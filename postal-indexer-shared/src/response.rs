//! Search response types.

use serde::{Deserialize, Serialize};

use crate::PostalCodeEntry;

/// A single ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching entry.
    pub entry: PostalCodeEntry,
    /// Relevance score computed by the store.
    pub relevance_score: f64,
}

/// Ranked results of a search, ordered by descending relevance score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching entries, best first.
    pub results: Vec<SearchResult>,
    /// Total number of matches reported by the store.
    pub total: u64,
}

impl SearchResponse {
    /// An empty response.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of results in this response.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the response has no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether scores never increase from one result to the next.
    pub fn is_ranked(&self) -> bool {
        self.results
            .windows(2)
            .all(|pair| pair[0].relevance_score >= pair[1].relevance_score)
    }

    /// The entries without their scores, best first.
    pub fn entries(&self) -> impl Iterator<Item = &PostalCodeEntry> {
        self.results.iter().map(|result| &result.entry)
    }
}
