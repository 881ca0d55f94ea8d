//! MODS (Metadata Object Description Schema) bibliographic metadata.
//!
//! The structure is deliberately loose: every section is an optional JSON value
//! because the MODS shape varies by record type. A section found once is a map,
//! found several times a list of maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::record::classify_identifier;
use crate::utils::XmlElement;

/// MODS v3 namespace URI
pub const MODS_NAMESPACE: &str = "http://www.loc.gov/mods/v3";

/// Structured MODS metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BibliographicMetadata {
    pub title_info: Option<Value>,
    pub name_info: Option<Value>,
    pub origin_info: Option<Value>,
    pub language: Option<Value>,
    pub physical_description: Option<Value>,
    pub subjects: Option<Value>,
    pub classification: Option<Value>,
    pub related_items: Option<Value>,
    pub identifiers: Option<Value>,
    pub locations: Option<Value>,
    pub record_info: Option<Value>,
    /// Local extensions (set names, popularity scores, ...)
    pub extensions: Option<Value>,
    /// Source text this metadata was built from
    pub raw_source: Option<String>,
}

/// Flattened view of the most commonly needed fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataSummary {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publication_date: Option<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub format: Option<String>,
    pub subjects: Vec<String>,
    pub identifiers: BTreeMap<String, String>,
    /// Physical extent (e.g. "xii, 320 p.")
    pub physical_description: Option<String>,
    pub classification: Vec<String>,
}

impl BibliographicMetadata {
    /// Parse a MODS XML document.
    ///
    /// Never fails: a document that cannot be parsed yields metadata carrying
    /// only the raw text.
    pub fn from_xml(xml: &str) -> Self {
        let root = match XmlElement::parse(xml) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Could not parse MODS XML: {}", e);
                return Self::raw_only(xml);
            }
        };

        let mods = root.find("mods").unwrap_or(&root);
        let sections: Vec<&XmlElement> = mods
            .children
            .iter()
            .filter(|child| {
                child.namespace.is_none() || child.namespace.as_deref() == Some(MODS_NAMESPACE)
            })
            .collect();

        let section = |name: &str| -> Option<Value> {
            let mut found: Vec<Value> = sections
                .iter()
                .filter(|child| child.name == name)
                .map(|child| Value::Object(element_to_map(child)))
                .collect();
            match found.len() {
                0 => None,
                1 => found.pop(),
                _ => Some(Value::Array(found)),
            }
        };

        Self {
            title_info: section("titleInfo"),
            name_info: section("name"),
            origin_info: section("originInfo"),
            language: section("language"),
            physical_description: section("physicalDescription"),
            subjects: section("subject"),
            classification: section("classification"),
            related_items: section("relatedItem"),
            identifiers: section("identifier"),
            locations: section("location"),
            record_info: section("recordInfo"),
            extensions: section("extension"),
            raw_source: Some(xml.to_string()),
        }
    }

    /// Build from a MODS map already decoded from JSON or converted XML.
    ///
    /// Accepts either the MODS object itself or a `{"mods": ...}` wrapper.
    pub fn from_value(value: &Value) -> Self {
        let raw_source = serde_json::to_string(value).ok();
        let mods = value.get("mods").unwrap_or(value);

        let Some(mods) = mods.as_object() else {
            return Self {
                raw_source,
                ..Default::default()
            };
        };

        let single = |key: &str| mods.get(key).filter(|v| !v.is_null()).cloned();
        let listed = |key: &str| {
            mods.get(key).filter(|v| !v.is_null()).map(|v| match v {
                Value::Array(_) => v.clone(),
                other => Value::Array(vec![other.clone()]),
            })
        };

        Self {
            title_info: single("titleInfo"),
            name_info: listed("name"),
            origin_info: single("originInfo"),
            language: single("language"),
            physical_description: single("physicalDescription"),
            subjects: listed("subject"),
            classification: listed("classification"),
            related_items: listed("relatedItem"),
            identifiers: listed("identifier"),
            locations: single("location"),
            record_info: single("recordInfo"),
            extensions: single("extension"),
            raw_source,
        }
    }

    fn raw_only(raw: &str) -> Self {
        Self {
            raw_source: Some(raw.to_string()),
            ..Default::default()
        }
    }

    /// Whether no structured section was found
    pub fn is_empty(&self) -> bool {
        [
            &self.title_info,
            &self.name_info,
            &self.origin_info,
            &self.language,
            &self.physical_description,
            &self.subjects,
            &self.classification,
            &self.related_items,
            &self.identifiers,
            &self.locations,
            &self.record_info,
            &self.extensions,
        ]
        .iter()
        .all(|section| section.is_none())
    }

    /// Main title
    pub fn title(&self) -> Option<String> {
        items(self.title_info.as_ref())
            .find_map(|info| info.get("title").and_then(text_of))
    }

    /// Flatten the commonly used fields
    pub fn summary(&self) -> MetadataSummary {
        let origin = || items(self.origin_info.as_ref());

        let authors = items(self.name_info.as_ref())
            .flat_map(|name| items(name.get("namePart")))
            .filter_map(text_of)
            .collect();

        let subjects = items(self.subjects.as_ref())
            .flat_map(|subject| items(subject.get("topic")))
            .filter_map(text_of)
            .collect();

        let classification = items(self.classification.as_ref())
            .filter_map(text_of)
            .collect();

        let mut identifiers = BTreeMap::new();
        for identifier in items(self.identifiers.as_ref()) {
            let Some(value) = text_of(identifier) else {
                continue;
            };
            let scheme = attribute_of(identifier, "type")
                .map(|t| t.to_uppercase())
                .unwrap_or_else(|| classify_identifier(&value).to_string());
            identifiers.entry(scheme).or_insert(value);
        }

        MetadataSummary {
            title: self.title(),
            authors,
            publication_date: origin().find_map(|o| o.get("dateIssued").and_then(text_of)),
            publisher: origin().find_map(|o| o.get("publisher").and_then(text_of)),
            language: items(self.language.as_ref())
                .find_map(|l| l.get("languageTerm").and_then(text_of)),
            format: items(self.physical_description.as_ref())
                .find_map(|p| p.get("form").and_then(text_of)),
            subjects,
            identifiers,
            physical_description: items(self.physical_description.as_ref())
                .find_map(|p| p.get("extent").and_then(text_of)),
            classification,
        }
    }
}

/// Convert an element into a map of attributes, `text` and children.
/// Repeated child tags are folded into lists.
fn element_to_map(element: &XmlElement) -> Map<String, Value> {
    let mut map = Map::new();

    for (key, value) in &element.attributes {
        map.insert(key.clone(), Value::String(value.clone()));
    }

    if !element.text.is_empty() {
        map.insert("text".to_string(), Value::String(element.text.clone()));
    }

    for child in &element.children {
        let value = Value::Object(element_to_map(child));
        insert_folding(&mut map, &child.name, value);
    }

    map
}

/// Insert `value` under `key`, turning an existing entry into a list
pub(crate) fn insert_folding(map: &mut Map<String, Value>, key: &str, value: Value) {
    match map.get_mut(key) {
        Some(Value::Array(list)) => list.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key.to_string(), value);
        }
    }
}

/// Iterate a value that may be absent, a single item, or a list of items
pub(crate) fn items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    let slice: &[Value] = match value {
        Some(Value::Array(list)) => list,
        Some(Value::Null) | None => &[],
        Some(single) => std::slice::from_ref(single),
    };
    slice.iter()
}

/// Best-effort text content of a value.
///
/// Strings are trimmed, numbers rendered, maps read through `text` or `#text`,
/// lists yield their first item with text.
pub(crate) fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("#text"))
            .and_then(text_of),
        Value::Array(list) => list.iter().find_map(text_of),
        Value::Bool(_) | Value::Null => None,
    }
}

/// Attribute of a converted element, whether stored plain or `@`-prefixed
pub(crate) fn attribute_of<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    let map = value.as_object()?;
    map.get(&format!("@{}", name))
        .or_else(|| map.get(name))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_MODS: &str = r#"<mods xmlns="http://www.loc.gov/mods/v3">
  <titleInfo><title>Test Book Title</title><subTitle>A Study</subTitle></titleInfo>
  <name type="personal"><namePart>Test Author</namePart><namePart type="date">1900-1980</namePart></name>
  <name type="corporate"><namePart>Harvard University</namePart></name>
  <originInfo>
    <place><placeTerm type="text">Cambridge, Mass.</placeTerm></place>
    <publisher>Harvard University Press</publisher>
    <dateIssued>1950</dateIssued>
  </originInfo>
  <language><languageTerm type="code" authority="iso639-2b">eng</languageTerm></language>
  <physicalDescription><form authority="marcform">print</form><extent>xii, 320 p.</extent></physicalDescription>
  <subject><topic>History</topic><topic>Education</topic></subject>
  <subject><topic>Libraries</topic></subject>
  <classification authority="lcc">Z733.H3</classification>
  <identifier type="isbn">9781234567890</identifier>
  <identifier type="oclc">ocm12345678</identifier>
  <recordInfo><recordIdentifier source="MH:ALMA">990012345670203941</recordIdentifier></recordInfo>
</mods>"#;

    #[test]
    fn test_title_from_minimal_document() {
        let metadata = BibliographicMetadata::from_xml(
            "<mods><titleInfo><title>Test Book Title</title></titleInfo></mods>",
        );
        assert_eq!(metadata.title().as_deref(), Some("Test Book Title"));
        assert_eq!(
            metadata.summary().title.as_deref(),
            Some("Test Book Title")
        );
    }

    #[test]
    fn test_single_and_repeated_sections() {
        let metadata = BibliographicMetadata::from_xml(SAMPLE_MODS);

        assert!(metadata.title_info.as_ref().unwrap().is_object());
        assert!(metadata.name_info.as_ref().unwrap().is_array());
        assert!(metadata.subjects.as_ref().unwrap().is_array());
        assert!(metadata.identifiers.as_ref().unwrap().is_array());
        assert!(metadata.related_items.is_none());
        assert_eq!(metadata.raw_source.as_deref(), Some(SAMPLE_MODS));

        // attributes are plain keys, repeated children fold into lists
        let first_name = &metadata.name_info.as_ref().unwrap()[0];
        assert_eq!(first_name["type"], "personal");
        assert_eq!(first_name["namePart"][1]["type"], "date");
    }

    #[test]
    fn test_summary() {
        let summary = BibliographicMetadata::from_xml(SAMPLE_MODS).summary();

        assert_eq!(summary.title.as_deref(), Some("Test Book Title"));
        assert_eq!(
            summary.authors,
            vec!["Test Author", "1900-1980", "Harvard University"]
        );
        assert_eq!(summary.publication_date.as_deref(), Some("1950"));
        assert_eq!(
            summary.publisher.as_deref(),
            Some("Harvard University Press")
        );
        assert_eq!(summary.language.as_deref(), Some("eng"));
        assert_eq!(summary.format.as_deref(), Some("print"));
        assert_eq!(
            summary.physical_description.as_deref(),
            Some("xii, 320 p.")
        );
        assert_eq!(summary.subjects, vec!["History", "Education", "Libraries"]);
        assert_eq!(summary.classification, vec!["Z733.H3"]);
        assert_eq!(summary.identifiers["ISBN"], "9781234567890");
        assert_eq!(summary.identifiers["OCLC"], "ocm12345678");
    }

    #[test]
    fn test_prefixed_namespace_and_foreign_elements() {
        let xml = r#"<collection><mods:mods xmlns:mods="http://www.loc.gov/mods/v3" xmlns:x="urn:other">
  <mods:titleInfo><mods:title>Prefixed</mods:title></mods:titleInfo>
  <x:titleInfo><x:title>Foreign</x:title></x:titleInfo>
</mods:mods></collection>"#;
        let metadata = BibliographicMetadata::from_xml(xml);
        assert!(metadata.title_info.as_ref().unwrap().is_object());
        assert_eq!(metadata.title().as_deref(), Some("Prefixed"));
    }

    #[test]
    fn test_malformed_xml_keeps_raw_text() {
        let metadata = BibliographicMetadata::from_xml("<mods><titleInfo>");
        assert!(metadata.is_empty());
        assert_eq!(metadata.raw_source.as_deref(), Some("<mods><titleInfo>"));
        assert_eq!(metadata.summary(), MetadataSummary::default());
    }

    #[test]
    fn test_from_value_with_converted_xml_shape() {
        let value = json!({
            "mods": {
                "titleInfo": {"title": "Converted"},
                "name": {"namePart": ["Doe, Jane", {"@type": "date", "#text": "1950-"}]},
                "identifier": {"@type": "isbn", "#text": "9780000000002"},
                "subject": [{"topic": "Maps"}, {"topic": {"#text": "Atlases"}}]
            }
        });
        let metadata = BibliographicMetadata::from_value(&value);
        assert!(metadata.name_info.as_ref().unwrap().is_array());

        let summary = metadata.summary();
        assert_eq!(summary.title.as_deref(), Some("Converted"));
        assert_eq!(summary.authors, vec!["Doe, Jane", "1950-"]);
        assert_eq!(summary.subjects, vec!["Maps", "Atlases"]);
        assert_eq!(summary.identifiers["ISBN"], "9780000000002");
        assert!(metadata.raw_source.unwrap().contains("Converted"));
    }

    #[test]
    fn test_from_value_non_object() {
        let metadata = BibliographicMetadata::from_value(&json!("just text"));
        assert!(metadata.is_empty());
        assert_eq!(metadata.raw_source.as_deref(), Some("\"just text\""));
    }

    #[test]
    fn test_text_of() {
        assert_eq!(text_of(&json!("  x  ")), Some("x".to_string()));
        assert_eq!(text_of(&json!("   ")), None);
        assert_eq!(text_of(&json!(42)), Some("42".to_string()));
        assert_eq!(text_of(&json!({"#text": "y"})), Some("y".to_string()));
        assert_eq!(text_of(&json!([null, {"text": "z"}])), Some("z".to_string()));
        assert_eq!(text_of(&json!({"other": "w"})), None);
    }

    #[test]
    fn test_insert_folding() {
        let mut map = Map::new();
        insert_folding(&mut map, "a", json!(1));
        assert_eq!(map["a"], json!(1));
        insert_folding(&mut map, "a", json!(2));
        insert_folding(&mut map, "a", json!(3));
        assert_eq!(map["a"], json!([1, 2, 3]));
    }
}
