//! Postal code entry, the record stored and searched by the indexer.

use serde::{Deserialize, Serialize};

/// A single postal code record.
///
/// All fields are free text and any of them may be empty. Entries carry no
/// identity beyond their field values, so duplicates are allowed.
///
/// The serialized form uses the camelCase field names of the stored document
/// (`countryCode`, `postalCode`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalCodeEntry {
    /// ISO country code, e.g. `FR`.
    #[serde(default)]
    pub country_code: String,
    /// Postal code, e.g. `75001`.
    #[serde(default)]
    pub postal_code: String,
    /// Place name.
    #[serde(default)]
    pub place_name: String,
    /// First order subdivision (state, region).
    #[serde(default)]
    pub admin_name1: String,
    /// Second order subdivision (county, department).
    #[serde(default)]
    pub admin_name2: String,
}

impl PostalCodeEntry {
    /// Create a new entry from its five fields.
    pub fn new(
        country_code: impl Into<String>,
        postal_code: impl Into<String>,
        place_name: impl Into<String>,
        admin_name1: impl Into<String>,
        admin_name2: impl Into<String>,
    ) -> Self {
        Self {
            country_code: country_code.into(),
            postal_code: postal_code.into(),
            place_name: place_name.into(),
            admin_name1: admin_name1.into(),
            admin_name2: admin_name2.into(),
        }
    }
}
