//! Parser module for the postal indexer ingest.
//!
//! Turns raw tab-delimited lines into postal code entries.

use postal_indexer_shared::PostalCodeEntry;

/// Column separator of the input format.
const SEPARATOR: char = '\t';

/// Parse one tab-delimited line into a `PostalCodeEntry`.
///
/// Columns map as `0: country_code`, `1: postal_code`, `2: place_name`,
/// `3: admin_name1`, `5: admin_name2`. Column 4 is present in well-formed
/// data but not stored. Missing columns become empty strings, so short or
/// malformed lines never fail.
pub fn parse_line(line: &str) -> PostalCodeEntry {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut columns = line.split(SEPARATOR);
    let mut next = || columns.next().unwrap_or_default().to_string();

    let country_code = next();
    let postal_code = next();
    let place_name = next();
    let admin_name1 = next();
    let _ = next();
    let admin_name2 = next();

    PostalCodeEntry {
        country_code,
        postal_code,
        place_name,
        admin_name1,
        admin_name2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let entry = parse_line("FR\t75001\tParis 01 Louvre\tIle-de-France\t11\tParis\t75\t751\t48.86\t2.34\t5");

        assert_eq!(entry.country_code, "FR");
        assert_eq!(entry.postal_code, "75001");
        assert_eq!(entry.place_name, "Paris 01 Louvre");
        assert_eq!(entry.admin_name1, "Ile-de-France");
        assert_eq!(entry.admin_name2, "Paris");
    }

    #[test]
    fn test_column_four_is_skipped() {
        let entry = parse_line("DE\t10115\tBerlin\tBerlin\tBE\tBerlin, Stadt");

        assert_eq!(entry.admin_name1, "Berlin");
        assert_eq!(entry.admin_name2, "Berlin, Stadt");
        assert_ne!(entry.admin_name2, "BE");
    }

    #[test]
    fn test_short_line_yields_empty_fields() {
        let entry = parse_line("US\t90210");

        assert_eq!(entry.country_code, "US");
        assert_eq!(entry.postal_code, "90210");
        assert!(entry.place_name.is_empty());
        assert!(entry.admin_name1.is_empty());
        assert!(entry.admin_name2.is_empty());
    }

    #[test]
    fn test_line_without_sixth_column() {
        let entry = parse_line("GB\tSW1A\tLondon\tEngland\tENG");

        assert_eq!(entry.admin_name1, "England");
        assert!(entry.admin_name2.is_empty());
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(parse_line(""), PostalCodeEntry::default());
    }

    #[test]
    fn test_empty_columns_are_kept_positionally() {
        let entry = parse_line("IT\t\tRoma\t\t\tRoma");

        assert_eq!(entry.country_code, "IT");
        assert!(entry.postal_code.is_empty());
        assert_eq!(entry.place_name, "Roma");
        assert!(entry.admin_name1.is_empty());
        assert_eq!(entry.admin_name2, "Roma");
    }

    #[test]
    fn test_crlf_line_ending_is_stripped() {
        let entry = parse_line("ES\t28001\tMadrid\tMadrid\tMD\tMadrid\r");
        assert_eq!(entry.admin_name2, "Madrid");
    }
}
