//! Locating records and counts inside upstream response bodies.
//!
//! Search responses nest records under `items`, which may be a list, an
//! `item` entry, a `mods` entry (one or many), or a map of keyed sub-records
//! each carrying `mods`. XML bodies arrive wrapped in their root element.

use serde_json::{json, Value};

use crate::models::items;

/// Top-level keys that mark a body as already unwrapped
const CONTENT_KEYS: [&str; 7] = [
    "items",
    "pagination",
    "mods",
    "titleInfo",
    "name",
    "nameInfo",
    "originInfo",
];

/// Strip a single wrapping root element (`{"results": {...}}`).
///
/// Bodies that already expose `items` or `pagination`, bare `{"mods": ...}`
/// wrappers and bare MODS records are left as they are.
pub fn unwrap_root(data: &Value) -> &Value {
    let Some(map) = data.as_object() else {
        return data;
    };
    if map.len() != 1 || CONTENT_KEYS.iter().any(|key| map.contains_key(*key)) {
        return data;
    }
    match map.values().next() {
        Some(inner @ Value::Object(_)) => inner,
        _ => data,
    }
}

/// Raw record entries of a search response, in upstream order.
///
/// Entries are returned as found; callers decide what to do with entries
/// that are not objects.
pub fn locate_records(data: &Value) -> Vec<Value> {
    let doc = unwrap_root(data);
    let Some(entries) = doc.get("items") else {
        return Vec::new();
    };

    match entries {
        Value::Array(list) => list.clone(),
        Value::Object(map) => {
            if let Some(item) = map.get("item") {
                items(Some(item)).cloned().collect()
            } else if let Some(mods) = map.get("mods") {
                items(Some(mods)).map(|m| json!({ "mods": m })).collect()
            } else {
                // keyed sub-records, each carrying its own `mods`
                map.values()
                    .flat_map(|v| items(Some(v)))
                    .filter(|v| v.get("mods").is_some())
                    .cloned()
                    .collect()
            }
        }
        _ => Vec::new(),
    }
}

/// Upstream-reported total number of matches, 0 when absent or unreadable
pub fn total_count(data: &Value) -> u64 {
    let doc = unwrap_root(data);
    let pagination = doc.get("pagination");

    let candidates = [
        pagination.and_then(|p| p.get("numFound")),
        pagination.and_then(|p| p.get("total")),
        doc.get("numFound"),
        doc.get("total"),
        doc.get("totalResults"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(as_count)
        .unwrap_or(0)
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The record inside a detail response.
///
/// A detail body may be a bare record, a `{"mods": ...}` wrapper or a
/// search-style envelope, in which case the first object record wins.
/// `None` means the body holds no record.
pub fn locate_detail(data: &Value) -> Option<Value> {
    let doc = unwrap_root(data);

    if doc.get("items").is_some() {
        return locate_records(doc).into_iter().find(Value::is_object);
    }

    match doc {
        Value::Object(map) if !map.is_empty() => Some(doc.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_item_list() {
        let data = json!({
            "items": {"item": [{"id": "1"}, {"id": "2"}]},
            "pagination": {"numFound": 2}
        });
        let records = locate_records(&data);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["id"], "2");
        assert_eq!(total_count(&data), 2);
    }

    #[test]
    fn test_items_single_item() {
        let data = json!({"items": {"item": {"id": "only"}}});
        let records = locate_records(&data);
        assert_eq!(records, vec![json!({"id": "only"})]);
        assert_eq!(total_count(&data), 0);
    }

    #[test]
    fn test_items_mods_are_rewrapped() {
        let single = json!({"items": {"mods": {"titleInfo": {"title": "A"}}}});
        assert_eq!(
            locate_records(&single),
            vec![json!({"mods": {"titleInfo": {"title": "A"}}})]
        );

        let many = json!({"items": {"mods": [{"titleInfo": {"title": "A"}}, {"titleInfo": {"title": "B"}}]}});
        let records = locate_records(&many);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["mods"]["titleInfo"]["title"], "B");
    }

    #[test]
    fn test_items_keyed_sub_records() {
        let data = json!({
            "items": {
                "a": {"mods": {"titleInfo": {"title": "A"}}},
                "b": {"mods": {"titleInfo": {"title": "B"}}},
                "noise": "ignored"
            }
        });
        assert_eq!(locate_records(&data).len(), 2);
    }

    #[test]
    fn test_items_plain_list_keeps_non_objects() {
        let data = json!({"items": [{"id": "1"}, "junk", 3]});
        assert_eq!(locate_records(&data).len(), 3);
    }

    #[test]
    fn test_missing_items() {
        assert!(locate_records(&json!({})).is_empty());
        assert!(locate_records(&json!({"items": null})).is_empty());
        assert!(locate_records(&json!("text")).is_empty());
    }

    #[test]
    fn test_wrapped_root_is_unwrapped() {
        let data = json!({
            "results": {
                "pagination": {"numFound": "57"},
                "items": {"mods": [{"titleInfo": {"title": "A"}}]}
            }
        });
        assert_eq!(locate_records(&data).len(), 1);
        assert_eq!(total_count(&data), 57);
    }

    #[test]
    fn test_total_count_fallbacks() {
        assert_eq!(total_count(&json!({"pagination": {"total": 9}})), 9);
        assert_eq!(total_count(&json!({"numFound": "12", "items": []})), 12);
        assert_eq!(total_count(&json!({"totalResults": 4.0, "items": []})), 4);
        assert_eq!(
            total_count(&json!({"pagination": {"numFound": "many"}, "total": 3})),
            3
        );
        assert_eq!(total_count(&json!({"pagination": {"numFound": -1}})), 0);
    }

    #[test]
    fn test_locate_detail_shapes() {
        let bare = json!({"id": "1", "title": "T"});
        assert_eq!(locate_detail(&bare), Some(bare.clone()));

        let wrapped = json!({"mods": {"titleInfo": {"title": "T"}}});
        assert_eq!(locate_detail(&wrapped), Some(wrapped.clone()));

        let envelope = json!({"items": {"item": [{"id": "first"}, {"id": "second"}]}});
        assert_eq!(locate_detail(&envelope), Some(json!({"id": "first"})));

        assert_eq!(locate_detail(&json!({"items": []})), None);
        assert_eq!(locate_detail(&json!({})), None);
    }
}
