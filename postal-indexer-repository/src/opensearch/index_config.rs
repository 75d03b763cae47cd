//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the postal code
//! index.

use serde_json::{json, Value};

/// The default name of the postal code index.
pub const DEFAULT_INDEX_NAME: &str = "postal_codes";

/// Text fields stored for every postal code entry, by document name.
pub const ENTRY_FIELDS: [&str; 5] = [
    "countryCode",
    "postalCode",
    "placeName",
    "adminName1",
    "adminName2",
];

/// Configuration of the postal code index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Name of the index.
    pub name: String,
    /// Number of primary shards used when the index is created.
    pub number_of_shards: u32,
    /// Number of replicas used when the index is created.
    pub number_of_replicas: u32,
}

impl IndexConfig {
    /// Create an index configuration with the given name and default sharding.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Get the index settings and mappings for the postal code index.
    ///
    /// Every entry field is mapped as `text` for full-text scoring, with a
    /// `raw` keyword subfield used for deterministic tie ordering.
    pub fn index_settings(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for field in ENTRY_FIELDS {
            properties.insert(
                field.to_string(),
                json!({
                    "type": "text",
                    "fields": {
                        "raw": {
                            "type": "keyword"
                        }
                    }
                }),
            );
        }

        json!({
            "settings": {
                "number_of_shards": self.number_of_shards,
                "number_of_replicas": self.number_of_replicas
            },
            "mappings": {
                "properties": properties
            }
        })
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_INDEX_NAME.to_string(),
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = IndexConfig::default().index_settings();

        assert_eq!(settings["settings"]["number_of_shards"], 1);
        assert_eq!(settings["settings"]["number_of_replicas"], 1);

        for field in ENTRY_FIELDS {
            let mapping = &settings["mappings"]["properties"][field];
            assert_eq!(mapping["type"], "text", "field {}", field);
            assert_eq!(mapping["fields"]["raw"]["type"], "keyword", "field {}", field);
        }
    }

    #[test]
    fn test_index_name() {
        assert_eq!(IndexConfig::default().name, "postal_codes");
        assert_eq!(IndexConfig::new("geo").name, "geo");
    }
}
