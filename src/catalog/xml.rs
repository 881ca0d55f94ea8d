//! Conversion of XML response bodies into the JSON shape used for JSON bodies.
//!
//! The root tag becomes the single top-level key. Attributes are stored as
//! `@name`, character data next to attributes or children as `#text`, and a
//! leaf element collapses to its text. Repeated sibling tags become lists.

use serde_json::{json, Map, Value};

use crate::models::insert_folding;
use crate::utils::XmlElement;

/// Convert an XML document to a nested map.
///
/// A document that cannot be parsed yields
/// `{"error": "XML parsing failed", "raw_content": <text>}`.
pub fn xml_to_value(text: &str) -> Value {
    match XmlElement::parse(text) {
        Ok(root) => {
            let mut map = Map::new();
            map.insert(root.name.clone(), element_value(&root));
            Value::Object(map)
        }
        Err(e) => {
            tracing::warn!("Error parsing XML response: {}", e);
            json!({"error": "XML parsing failed", "raw_content": text})
        }
    }
}

fn element_value(element: &XmlElement) -> Value {
    if element.is_leaf() {
        return if element.text.is_empty() {
            Value::Null
        } else {
            Value::String(element.text.clone())
        };
    }

    let mut map = Map::new();
    for (key, value) in &element.attributes {
        map.insert(format!("@{}", key), Value::String(value.clone()));
    }
    for child in &element.children {
        insert_folding(&mut map, &child.name, element_value(child));
    }
    if !element.text.is_empty() {
        map.insert("#text".to_string(), Value::String(element.text.clone()));
    }
    Value::Object(map)
}
