//! OpenSearch query builders.

use serde_json::{json, Value};

use crate::opensearch::index_config::ENTRY_FIELDS;
use postal_indexer_shared::SearchQuery;

/// Build an OpenSearch search body from a SearchQuery.
///
/// The body uses:
/// - `multi_match` of type `most_fields` across all entry fields, so a term
///   matching several fields scores higher, with `or` semantics between terms
/// - `size` set to the query limit, so the store does the cutting
/// - a sort on descending `_score`, then on the `raw` keyword subfields of
///   postal code and place name so that ties come back in a fixed order
pub fn build_search_query(query: &SearchQuery) -> Value {
    json!({
        "query": {
            "multi_match": {
                "query": query.text,
                "type": "most_fields",
                "operator": "or",
                "fields": ENTRY_FIELDS
            }
        },
        "size": query.limit,
        "track_total_hits": true,
        "sort": [
            { "_score": { "order": "desc" } },
            { "postalCode.raw": { "order": "asc" } },
            { "placeName.raw": { "order": "asc" } }
        ]
    })
}
