//! Best-effort normalization of raw upstream records into [`CatalogRecord`].
//!
//! Upstream schemas are not stable, so every field is read through an ordered
//! table of extraction strategies. The first strategy that yields a value wins
//! for single-valued fields; list fields collect across all strategies.
//!
//! Records come in two shapes, decided once per record by [`RawRecord::classify`]:
//! MODS-shaped payloads (a `mods` key, or top-level MODS sections) and flat
//! payloads with ad hoc field names.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::permalink::{first_alma_id, permalink_url};
use crate::models::{
    attribute_of, classify_identifier, items, text_of, BibliographicMetadata, CatalogRecord,
};

/// How to reach a value inside a raw record
#[derive(Debug, Clone, Copy)]
enum Strategy {
    /// Walk these keys in order, fanning out over lists at every step
    Path(&'static [&'static str]),
    /// Search for this key at any depth below the given section
    Nested(&'static str, &'static str),
}

impl Strategy {
    /// Every value this strategy reaches, with lists flattened
    fn values<'a>(&self, root: &'a Map<String, Value>) -> Vec<&'a Value> {
        match self {
            Strategy::Path(path) => walk(root, path),
            Strategy::Nested(section, key) => {
                let mut found = Vec::new();
                if let Some(section) = root.get(*section) {
                    collect_nested(section, key, &mut found);
                }
                found.into_iter().flat_map(|v| items(Some(v))).collect()
            }
        }
    }
}

fn walk<'a>(root: &'a Map<String, Value>, path: &[&str]) -> Vec<&'a Value> {
    let Some((first, rest)) = path.split_first() else {
        return Vec::new();
    };
    let mut current: Vec<&Value> = items(root.get(*first)).collect();
    for key in rest {
        current = current
            .into_iter()
            .filter_map(|v| v.get(*key))
            .flat_map(|v| items(Some(v)))
            .collect();
    }
    current
}

fn collect_nested<'a>(value: &'a Value, key: &str, found: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    found.push(v);
                } else {
                    collect_nested(v, key, found);
                }
            }
        }
        Value::Array(list) => {
            for v in list {
                collect_nested(v, key, found);
            }
        }
        _ => {}
    }
}

/// First text reached by any strategy, in table order
fn first_text(root: &Map<String, Value>, strategies: &[Strategy]) -> Option<String> {
    strategies
        .iter()
        .find_map(|s| s.values(root).into_iter().find_map(text_of))
}

/// All texts reached by all strategies, in table order, without de-duplication
fn all_texts(root: &Map<String, Value>, strategies: &[Strategy]) -> Vec<String> {
    strategies
        .iter()
        .flat_map(|s| s.values(root))
        .filter_map(text_of)
        .collect()
}

fn first_number(root: &Map<String, Value>, strategies: &[Strategy]) -> Option<f64> {
    strategies.iter().find_map(|s| {
        s.values(root).into_iter().find_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            other => text_of(other).and_then(|t| t.parse().ok()),
        })
    })
}

fn holdings_from(root: &Map<String, Value>, strategies: &[Strategy]) -> Option<Vec<Map<String, Value>>> {
    strategies.iter().find_map(|s| {
        let holdings: Vec<Map<String, Value>> = s
            .values(root)
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map.clone()),
                other => text_of(other).map(|text| {
                    let mut map = Map::new();
                    map.insert("location".to_string(), Value::String(text));
                    map
                }),
            })
            .collect();
        (!holdings.is_empty()).then_some(holdings)
    })
}

fn non_empty(list: Vec<String>) -> Option<Vec<String>> {
    (!list.is_empty()).then_some(list)
}

mod mods_fields {
    use super::Strategy::{self, Nested, Path};

    pub(super) const RECORD_ID: &[Strategy] = &[Path(&["recordInfo", "recordIdentifier"])];
    pub(super) const IDENTIFIER: &[Strategy] = &[Path(&["identifier"])];
    pub(super) const TITLE: &[Strategy] = &[Path(&["titleInfo", "title"]), Path(&["title"])];
    pub(super) const AUTHORS: &[Strategy] = &[
        Path(&["name", "namePart"]),
        Path(&["nameInfo", "namePart"]),
    ];
    pub(super) const DATE: &[Strategy] = &[
        Path(&["originInfo", "dateIssued"]),
        Path(&["originInfo", "dateCreated"]),
        Path(&["originInfo", "copyrightDate"]),
    ];
    pub(super) const PUBLISHER: &[Strategy] = &[Path(&["originInfo", "publisher"])];
    pub(super) const LANGUAGE: &[Strategy] = &[Path(&["language", "languageTerm"])];
    pub(super) const FORMAT: &[Strategy] = &[
        Path(&["physicalDescription", "form"]),
        Path(&["typeOfResource"]),
        Path(&["genre"]),
    ];
    pub(super) const SUBJECTS: &[Strategy] = &[Path(&["subject", "topic"])];
    pub(super) const DESCRIPTION: &[Strategy] = &[
        Path(&["abstract"]),
        Path(&["note"]),
        Path(&["tableOfContents"]),
    ];
    pub(super) const HOLDINGS: &[Strategy] = &[Path(&["location"])];
    pub(super) const CLASSIFICATION: &[Strategy] = &[Path(&["classification"])];
    pub(super) const COLLECTIONS: &[Strategy] = &[Nested("extension", "setName")];
    pub(super) const STACKSCORE: &[Strategy] = &[
        Nested("extension", "stackscore"),
        Nested("extension", "stackScore"),
    ];
    pub(super) const DIGITAL_FORMATS: &[Strategy] = &[Nested("extension", "digitalFormats")];
}

mod flat_fields {
    use super::Strategy::{self, Path};

    pub(super) const ID: &[Strategy] = &[Path(&["id"]), Path(&["@id"]), Path(&["recordId"])];
    pub(super) const TITLE: &[Strategy] = &[
        Path(&["titleInfo", "title"]),
        Path(&["title"]),
        Path(&["Title"]),
        Path(&["mods", "titleInfo", "title"]),
    ];
    pub(super) const AUTHORS: &[Strategy] = &[
        Path(&["nameInfo", "namePart"]),
        Path(&["author"]),
        Path(&["Author"]),
        Path(&["creator"]),
        Path(&["Creator"]),
    ];
    pub(super) const DATE: &[Strategy] = &[
        Path(&["originInfo", "dateIssued"]),
        Path(&["dateIssued"]),
        Path(&["date"]),
        Path(&["Date"]),
        Path(&["publicationDate"]),
        Path(&["pubDate"]),
    ];
    pub(super) const PUBLISHER: &[Strategy] = &[
        Path(&["originInfo", "publisher"]),
        Path(&["publisher"]),
        Path(&["Publisher"]),
    ];
    pub(super) const LANGUAGE: &[Strategy] = &[
        Path(&["language", "languageTerm"]),
        Path(&["language"]),
        Path(&["Language"]),
    ];
    pub(super) const FORMAT: &[Strategy] = &[
        Path(&["physicalDescription", "form"]),
        Path(&["format"]),
        Path(&["Format"]),
        Path(&["resourceType"]),
        Path(&["type"]),
    ];
    pub(super) const SUBJECTS: &[Strategy] = &[
        Path(&["subject", "topic"]),
        Path(&["subject"]),
        Path(&["Subject"]),
    ];
    pub(super) const DESCRIPTION: &[Strategy] = &[
        Path(&["abstract"]),
        Path(&["description"]),
        Path(&["Description"]),
        Path(&["note"]),
    ];
    pub(super) const HOLDINGS: &[Strategy] = &[
        Path(&["location"]),
        Path(&["holdings"]),
        Path(&["Holdings"]),
    ];
    pub(super) const CLASSIFICATION: &[Strategy] = &[
        Path(&["classification"]),
        Path(&["Classification"]),
        Path(&["lcc"]),
        Path(&["dewey"]),
    ];
    pub(super) const COLLECTIONS: &[Strategy] = &[
        Path(&["setName"]),
        Path(&["collection"]),
        Path(&["Collection"]),
        Path(&["setSpec"]),
    ];
    pub(super) const STACKSCORE: &[Strategy] = &[
        Path(&["stackscore"]),
        Path(&["Stackscore"]),
        Path(&["usage"]),
        Path(&["popularity"]),
    ];
    pub(super) const DIGITAL: [&str; 4] = ["digital", "online", "electronic", "hasDigital"];
    pub(super) const GENERIC_IDENTIFIERS: [&str; 3] = ["identifier", "id", "ID"];
}

/// A raw record, classified by shape
#[derive(Debug)]
pub enum RawRecord<'a> {
    /// MODS payload; `mods` is the MODS object (the record itself when unwrapped)
    Mods {
        record: &'a Map<String, Value>,
        mods: &'a Map<String, Value>,
    },
    /// Flat payload with ad hoc field names
    Flat(&'a Map<String, Value>),
}

impl<'a> RawRecord<'a> {
    pub fn classify(record: &'a Map<String, Value>) -> Self {
        if let Some(Value::Object(mods)) = record.get("mods") {
            return RawRecord::Mods { record, mods };
        }
        if ["titleInfo", "name", "originInfo"]
            .iter()
            .any(|key| record.contains_key(*key))
        {
            return RawRecord::Mods {
                record,
                mods: record,
            };
        }
        RawRecord::Flat(record)
    }

    #[cfg(test)]
    fn is_mods(&self) -> bool {
        matches!(self, RawRecord::Mods { .. })
    }
}

/// Normalize one raw record. Total: every input yields a record with a
/// non-empty id and an identifier map.
pub fn parse_record(raw: &Value) -> CatalogRecord {
    let Some(map) = raw.as_object() else {
        tracing::warn!("Record payload is not an object, keeping it raw");
        return CatalogRecord::minimal(synthesized_id(raw), raw.clone());
    };

    match RawRecord::classify(map) {
        RawRecord::Mods { record, mods } => parse_mods(record, mods, raw),
        RawRecord::Flat(record) => parse_flat(record, raw),
    }
}

fn parse_mods(record: &Map<String, Value>, mods: &Map<String, Value>, raw: &Value) -> CatalogRecord {
    use mods_fields as f;

    let upstream_id = first_text(mods, f::RECORD_ID)
        .or_else(|| first_text(mods, f::IDENTIFIER))
        .or_else(|| record.get("id").and_then(text_of))
        .or_else(|| mods.get("id").and_then(text_of));

    let mut identifiers = typed_identifiers(mods);
    if identifiers.is_empty() {
        identifiers = generic_identifiers(mods);
        for (scheme, value) in generic_identifiers(record) {
            identifiers.entry(scheme).or_insert(value);
        }
    }

    let record_identifiers = all_texts(mods, f::RECORD_ID);
    let serialized = serde_json::to_string(raw).unwrap_or_default();
    let permalink = first_alma_id(
        identifiers
            .values()
            .map(String::as_str)
            .chain(record_identifiers.iter().map(String::as_str))
            .chain(upstream_id.as_deref())
            .chain(std::iter::once(serialized.as_str())),
    )
    .map(|alma| permalink_url(&alma));

    let mut metadata = BibliographicMetadata::from_value(&Value::Object(mods.clone()));
    metadata.raw_source = Some(serialized);

    CatalogRecord {
        id: upstream_id.unwrap_or_else(|| synthesized_id(raw)),
        permalink,
        title: first_text(mods, f::TITLE),
        authors: all_texts(mods, f::AUTHORS),
        publication_date: first_text(mods, f::DATE),
        publisher: first_text(mods, f::PUBLISHER),
        language: first_text(mods, f::LANGUAGE),
        format_type: first_text(mods, f::FORMAT),
        subjects: all_texts(mods, f::SUBJECTS),
        description: first_text(mods, f::DESCRIPTION),
        identifiers,
        holdings: holdings_from(mods, f::HOLDINGS),
        classification: non_empty(all_texts(mods, f::CLASSIFICATION)),
        collections: non_empty(all_texts(mods, f::COLLECTIONS)),
        stackscore: first_number(mods, f::STACKSCORE),
        digital_content: mods_has_digital(mods),
        mods_metadata: Some(metadata),
        raw_data: raw.clone(),
    }
}

fn parse_flat(record: &Map<String, Value>, raw: &Value) -> CatalogRecord {
    use flat_fields as f;

    let upstream_id = first_text(record, f::ID);

    let mut identifiers = typed_identifiers(record);
    if identifiers.is_empty() {
        identifiers = generic_identifiers(record);
    }

    let serialized = serde_json::to_string(raw).unwrap_or_default();
    let permalink = first_alma_id(
        identifiers
            .values()
            .map(String::as_str)
            .chain(upstream_id.as_deref())
            .chain(std::iter::once(serialized.as_str())),
    )
    .map(|alma| permalink_url(&alma));

    CatalogRecord {
        id: upstream_id.unwrap_or_else(|| synthesized_id(raw)),
        permalink,
        title: first_text(record, f::TITLE),
        authors: all_texts(record, f::AUTHORS),
        publication_date: first_text(record, f::DATE),
        publisher: first_text(record, f::PUBLISHER),
        language: first_text(record, f::LANGUAGE),
        format_type: first_text(record, f::FORMAT),
        subjects: all_texts(record, f::SUBJECTS),
        description: first_text(record, f::DESCRIPTION),
        identifiers,
        holdings: holdings_from(record, f::HOLDINGS),
        classification: non_empty(all_texts(record, f::CLASSIFICATION)),
        collections: non_empty(all_texts(record, f::COLLECTIONS)),
        stackscore: first_number(record, f::STACKSCORE),
        digital_content: flat_has_digital(record),
        mods_metadata: None,
        raw_data: raw.clone(),
    }
}

/// Identifiers carrying an explicit `type`, keyed by the upper-cased type
fn typed_identifiers(root: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut identifiers = BTreeMap::new();
    for entry in items(root.get("identifier")) {
        let (Some(scheme), Some(value)) = (attribute_of(entry, "type"), text_of(entry)) else {
            continue;
        };
        identifiers.entry(scheme.to_uppercase()).or_insert(value);
    }
    identifiers
}

/// Untyped identifier values classified by prefix
fn generic_identifiers(root: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut identifiers = BTreeMap::new();
    for key in flat_fields::GENERIC_IDENTIFIERS {
        for entry in items(root.get(key)) {
            if attribute_of(entry, "type").is_some() {
                continue;
            }
            let value = match entry {
                Value::String(_) | Value::Object(_) => text_of(entry),
                _ => None,
            };
            if let Some(value) = value {
                identifiers
                    .entry(classify_identifier(&value).to_string())
                    .or_insert(value);
            }
        }
    }
    identifiers
}

fn mods_has_digital(mods: &Map<String, Value>) -> bool {
    let raw_object = walk(mods, &["location", "url"]).into_iter().any(|url| {
        attribute_of(url, "access").is_some_and(|access| access.eq_ignore_ascii_case("raw object"))
    });

    raw_object
        || mods_fields::DIGITAL_FORMATS
            .iter()
            .flat_map(|s| s.values(mods))
            .any(|v| text_of(v).is_some() || v.as_object().is_some_and(|m| !m.is_empty()))
}

fn flat_has_digital(record: &Map<String, Value>) -> bool {
    flat_fields::DIGITAL
        .iter()
        .find_map(|key| match record.get(*key)? {
            // a false flag defers to the next candidate
            Value::Bool(true) => Some(true),
            Value::String(s) if !s.is_empty() => {
                Some(matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"))
            }
            _ => None,
        })
        .unwrap_or(false)
}

/// Stable id derived from the serialized payload
pub fn synthesized_id(raw: &Value) -> String {
    let serialized = serde_json::to_string(raw).unwrap_or_default();
    format!("{:x}", md5::compute(serialized.as_bytes()))
}

/// Record-info identifiers of a MODS map (`{"mods": ...}` wrappers accepted)
pub fn record_identifiers(mods: &Value) -> Vec<String> {
    let mods = mods.get("mods").unwrap_or(mods);
    match mods.as_object() {
        Some(map) => all_texts(map, mods_fields::RECORD_ID),
        None => Vec::new(),
    }
}
