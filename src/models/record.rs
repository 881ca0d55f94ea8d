//! Catalog record and search result models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::mods::BibliographicMetadata;

/// A single normalized catalog record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord {
    /// Record identifier, synthesized from a content hash when upstream has none
    pub id: String,

    /// Catalog permalink derived from an Alma identifier
    pub permalink: Option<String>,

    pub title: Option<String>,

    /// Authors and other names, in upstream order
    #[serde(default)]
    pub authors: Vec<String>,

    /// Free-text publication date as reported upstream
    pub publication_date: Option<String>,

    pub publisher: Option<String>,

    pub language: Option<String>,

    pub format_type: Option<String>,

    #[serde(default)]
    pub subjects: Vec<String>,

    pub description: Option<String>,

    /// Identifier scheme (ISBN, ISSN, OCLC, ...) to value
    #[serde(default)]
    pub identifiers: BTreeMap<String, String>,

    /// Holdings and location entries
    pub holdings: Option<Vec<Map<String, Value>>>,

    /// Classification codes (LCC, Dewey, ...)
    pub classification: Option<Vec<String>>,

    /// Upstream collections (set names) this record belongs to
    pub collections: Option<Vec<String>>,

    /// Popularity score
    pub stackscore: Option<f64>,

    /// Whether a digital surrogate is available
    #[serde(default)]
    pub digital_content: bool,

    /// Structured MODS metadata, when the payload was MODS-shaped
    pub mods_metadata: Option<BibliographicMetadata>,

    /// The upstream payload this record was built from
    #[serde(default)]
    pub raw_data: Value,
}

impl CatalogRecord {
    /// A record carrying only an id and the raw payload
    pub fn minimal(id: impl Into<String>, raw_data: Value) -> Self {
        Self {
            id: id.into(),
            raw_data,
            ..Default::default()
        }
    }

    /// Title, or a placeholder for display
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }

    /// Authors joined for display
    pub fn authors_string(&self) -> String {
        self.authors.join("; ")
    }
}

/// Guess the scheme of an untyped identifier from its prefix
pub fn classify_identifier(value: &str) -> &'static str {
    let value = value.trim();
    if value.starts_with("978") || value.starts_with("979") {
        "ISBN"
    } else if value.starts_with("977") {
        "ISSN"
    } else if value.starts_with("ocm") {
        "OCLC"
    } else {
        "ID"
    }
}

/// Results from a catalog search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub records: Vec<CatalogRecord>,

    /// Upstream-reported total number of matches
    pub total_count: u64,

    pub limit: usize,

    pub offset: usize,

    /// Whether another page exists past `offset + limit`
    pub has_more: bool,

    /// Wall-clock search time in seconds
    pub search_time: Option<f64>,

    /// Decoded upstream response body
    pub raw_response: Option<Value>,
}

impl SearchResult {
    pub fn new(records: Vec<CatalogRecord>, total_count: u64, limit: usize, offset: usize) -> Self {
        let has_more = (offset as u64).saturating_add(limit as u64) < total_count;
        Self {
            records,
            total_count,
            limit,
            offset,
            has_more,
            search_time: None,
            raw_response: None,
        }
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_has_more() {
        let cases = [
            (20, 0, 100, true),
            (20, 80, 100, false),
            (20, 79, 100, true),
            (10, 0, 0, false),
            (1, 0, 1, false),
            (5, 10, 3, false),
        ];
        for (limit, offset, total, expected) in cases {
            let result = SearchResult::new(Vec::new(), total, limit, offset);
            assert_eq!(
                result.has_more, expected,
                "limit={} offset={} total={}",
                limit, offset, total
            );
        }
    }

    #[test]
    fn test_classify_identifier() {
        assert_eq!(classify_identifier("9781234567890"), "ISBN");
        assert_eq!(classify_identifier("9791234567896"), "ISBN");
        assert_eq!(classify_identifier("9770317847001"), "ISSN");
        assert_eq!(classify_identifier("ocm12345678"), "OCLC");
        assert_eq!(classify_identifier("HOLLIS-123"), "ID");
    }

    #[test]
    fn test_minimal_record() {
        let raw = json!({"foo": "bar"});
        let record = CatalogRecord::minimal("abc", raw.clone());
        assert_eq!(record.id, "abc");
        assert!(record.identifiers.is_empty());
        assert!(!record.digital_content);
        assert_eq!(record.raw_data, raw);
        assert_eq!(record.display_title(), "(untitled)");
    }

    #[test]
    fn test_record_serializes_identifiers_as_object() {
        let record = CatalogRecord::minimal("abc", Value::Null);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["identifiers"], json!({}));
        assert_eq!(value["permalink"], Value::Null);
    }
}
