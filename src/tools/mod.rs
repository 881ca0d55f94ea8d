//! Catalog tools shared by the MCP server, the REST mirror and the CLI.
//!
//! Each tool calls the [`CatalogClient`] once and shapes the outcome into a JSON
//! envelope with a `success` flag. Tools never fail: errors are reported inside
//! the envelope.

mod collections;
mod requests;

pub use collections::{Collection, COLLECTIONS_NOTE, KNOWN_COLLECTIONS};
pub use requests::{
    validate_date, validate_limit, AdvancedSearchRequest, DateRangeRequest, FieldSearchRequest,
    GeographicRequest, ParseModsRequest, PermalinkRequest, RecordRequest, SearchCatalogRequest,
    SearchField, DEFAULT_LIMIT, MAX_LIMIT,
};

use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::catalog::{
    find_alma_id, first_alma_id, permalink_url, record_identifiers, xml_to_value, CatalogClient,
    CatalogError,
};
use crate::models::{BibliographicMetadata, SearchQuery, SearchResult};

/// The catalog tool set, backed by one shared client
#[derive(Debug, Clone)]
pub struct CatalogTools {
    client: Arc<CatalogClient>,
}

impl CatalogTools {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<CatalogClient> {
        &self.client
    }

    async fn run_search(&self, query: &SearchQuery) -> Result<SearchResult, CatalogError> {
        self.client.search(query).await
    }

    /// General free-text search
    pub async fn search_catalog(&self, req: &SearchCatalogRequest) -> Value {
        match self.run_search(&req.to_query()).await {
            Ok(result) => {
                let mut envelope = search_envelope(&result);
                envelope.insert("search_time".to_string(), json!(result.search_time));
                Value::Object(envelope)
            }
            Err(e) => {
                tracing::error!("Error in search_catalog: {}", e);
                Value::Object(search_error(&e))
            }
        }
    }

    pub async fn search_by_title(&self, req: &FieldSearchRequest) -> Value {
        self.field_search(SearchField::Title, req).await
    }

    pub async fn search_by_author(&self, req: &FieldSearchRequest) -> Value {
        self.field_search(SearchField::Author, req).await
    }

    pub async fn search_by_subject(&self, req: &FieldSearchRequest) -> Value {
        self.field_search(SearchField::Subject, req).await
    }

    /// Search within one upstream set; the envelope echoes the collection
    pub async fn search_by_collection(&self, req: &FieldSearchRequest) -> Value {
        self.field_search(SearchField::Collection, req).await
    }

    async fn field_search(&self, field: SearchField, req: &FieldSearchRequest) -> Value {
        let outcome = self.run_search(&req.to_query(field)).await;
        let mut envelope = match outcome {
            Ok(result) => search_envelope(&result),
            Err(e) => {
                tracing::error!("Error in search_by_{}: {}", field, e);
                search_error(&e)
            }
        };
        if field == SearchField::Collection {
            envelope.insert("collection".to_string(), json!(req.value));
        }
        Value::Object(envelope)
    }

    pub async fn search_by_date_range(&self, req: &DateRangeRequest) -> Value {
        let mut envelope = match self.run_search(&req.to_query()).await {
            Ok(result) => search_envelope(&result),
            Err(e) => {
                tracing::error!("Error in search_by_date_range: {}", e);
                search_error(&e)
            }
        };
        envelope.insert(
            "date_range".to_string(),
            json!(format!("{} to {}", req.start_date, req.end_date)),
        );
        Value::Object(envelope)
    }

    pub async fn search_by_geographic_origin(&self, req: &GeographicRequest) -> Value {
        let mut envelope = match self.run_search(&req.to_query()).await {
            Ok(result) => search_envelope(&result),
            Err(e) => {
                tracing::error!("Error in search_by_geographic_origin: {}", e);
                search_error(&e)
            }
        };
        envelope.insert("origin_place".to_string(), json!(req.origin_place));
        Value::Object(envelope)
    }

    pub async fn advanced_search(&self, req: &AdvancedSearchRequest) -> Value {
        match self.run_search(&req.to_query()).await {
            Ok(result) => {
                let mut envelope = search_envelope(&result);
                envelope.insert("filters".to_string(), json!(req.filter_summary()));
                envelope.insert("sort".to_string(), json!(req.sort_summary()));
                Value::Object(envelope)
            }
            Err(e) => {
                tracing::error!("Error in advanced_search: {}", e);
                Value::Object(search_error(&e))
            }
        }
    }

    pub async fn get_record_details(&self, req: &RecordRequest) -> Value {
        match self
            .client
            .get_record_by_id(&req.record_id, req.response_format)
            .await
        {
            Ok(Some(record)) => json!({
                "success": true,
                "record": record,
            }),
            Ok(None) => json!({
                "success": false,
                "error": format!("Record {} not found", req.record_id),
                "record": null,
            }),
            Err(e) => {
                tracing::error!("Error in get_record_details: {}", e);
                json!({
                    "success": false,
                    "error": e.to_string(),
                    "record": null,
                })
            }
        }
    }

    pub fn get_collections_list(&self) -> Value {
        collections_envelope()
    }

    pub fn parse_mods_metadata(&self, req: &ParseModsRequest) -> Value {
        parse_mods_envelope(&req.mods_xml)
    }

    pub fn parse_permalink(&self, req: &PermalinkRequest) -> Value {
        permalink_envelope(req)
    }
}

fn search_envelope(result: &SearchResult) -> Map<String, Value> {
    let mut envelope = Map::new();
    envelope.insert("success".to_string(), Value::Bool(true));
    envelope.insert("records".to_string(), json!(result.records));
    envelope.insert("total_count".to_string(), json!(result.total_count));
    envelope.insert("limit".to_string(), json!(result.limit));
    envelope.insert("offset".to_string(), json!(result.offset));
    envelope.insert("has_more".to_string(), json!(result.has_more));
    envelope
}

fn search_error(err: &CatalogError) -> Map<String, Value> {
    let mut envelope = Map::new();
    envelope.insert("success".to_string(), Value::Bool(false));
    envelope.insert("error".to_string(), json!(err.to_string()));
    envelope.insert("records".to_string(), json!([]));
    envelope.insert("total_count".to_string(), json!(0));
    envelope
}

/// The curated collections with an explanatory note
pub fn collections_envelope() -> Value {
    json!({
        "success": true,
        "collections": KNOWN_COLLECTIONS,
        "note": COLLECTIONS_NOTE,
    })
}

/// Parse MODS XML into a summary plus the full structure
pub fn parse_mods_envelope(mods_xml: &str) -> Value {
    let metadata = BibliographicMetadata::from_xml(mods_xml);
    json!({
        "success": true,
        "parsed_metadata": metadata.summary(),
        "full_metadata": metadata,
    })
}

/// Look for an Alma id in identifiers, MODS record info, the record id and
/// finally the raw MODS text
pub fn permalink_envelope(req: &PermalinkRequest) -> Value {
    let identifier_values: Vec<String> = req
        .identifiers
        .iter()
        .flat_map(|map| map.values())
        .filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();

    let mut record_info = Vec::new();
    if let Some(mods) = &req.mods_dict {
        record_info.extend(record_identifiers(mods));
    }
    if let Some(xml) = &req.mods_xml {
        record_info.extend(record_identifiers(&xml_to_value(xml)));
    }

    let structured = identifier_values
        .iter()
        .chain(record_info.iter())
        .map(String::as_str)
        .chain(req.record_id.as_deref());

    let alma_id = first_alma_id(structured).or_else(|| {
        let raw = req
            .mods_xml
            .clone()
            .or_else(|| req.mods_dict.as_ref().map(Value::to_string))?;
        find_alma_id(&raw)
    });

    json!({
        "success": true,
        "permalink": alma_id.as_deref().map(permalink_url),
        "alma_id": alma_id,
    })
}
