//! Typed tool inputs.
//!
//! Every request deserializes from the JSON arguments of an MCP tool call or a
//! REST body, with the same defaults the tool schemas advertise.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{ResponseFormat, SearchQuery, SortOrder};

/// Largest page a caller may request
pub const MAX_LIMIT: usize = 100;

pub const DEFAULT_LIMIT: usize = 20;

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// Check a page size against `1..=MAX_LIMIT`
pub fn validate_limit(limit: usize) -> Result<(), String> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(())
    } else {
        Err(format!("limit must be between 1 and {}, got {}", MAX_LIMIT, limit))
    }
}

/// Check a `YYYY-MM-DD` date
pub fn validate_date(field: &str, value: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("{} must be a date in YYYY-MM-DD format, got '{}'", field, value))
}

fn validate_optional_date(field: &str, value: &Option<String>) -> Result<(), String> {
    match value {
        Some(v) => validate_date(field, v),
        None => Ok(()),
    }
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("'{}' must not be empty", field))
    } else {
        Ok(())
    }
}

/// General free-text search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCatalogRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl SearchCatalogRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_limit(self.limit)
    }

    pub fn to_query(&self) -> SearchQuery {
        SearchQuery::new(self.query.clone())
            .limit(self.limit)
            .offset(self.offset)
            .response_format(self.response_format)
    }
}

/// The field a single-field search filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Author,
    Subject,
    Collection,
}

impl SearchField {
    /// Argument name in tool calls and REST bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Author => "author",
            SearchField::Subject => "subject",
            SearchField::Collection => "collection",
        }
    }
}

impl std::fmt::Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search on one field. The value doubles as the free-text query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSearchRequest {
    #[serde(alias = "field_value")]
    pub value: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl FieldSearchRequest {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            limit: DEFAULT_LIMIT,
            offset: 0,
            response_format: ResponseFormat::default(),
        }
    }

    /// Build from tool arguments, where the value sits under the field's name
    pub fn from_args(field: SearchField, args: &Value) -> Result<Self, String> {
        let mut map = match args {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => return Err("Arguments must be an object".to_string()),
        };
        let value = map
            .remove(field.as_str())
            .ok_or_else(|| format!("Missing '{}' parameter", field))?;
        map.insert("value".to_string(), value);
        serde_json::from_value(Value::Object(map)).map_err(|e| e.to_string())
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_limit(self.limit)
    }

    pub fn to_query(&self, field: SearchField) -> SearchQuery {
        let query = SearchQuery::new(self.value.clone())
            .limit(self.limit)
            .offset(self.offset)
            .response_format(self.response_format);
        match field {
            SearchField::Title => query.title(self.value.clone()),
            SearchField::Author => query.author(self.value.clone()),
            SearchField::Subject => query.subject(self.value.clone()),
            SearchField::Collection => query.collection(self.value.clone()),
        }
    }
}

/// Publication date range search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeRequest {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl DateRangeRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_limit(self.limit)?;
        validate_date("start_date", &self.start_date)?;
        validate_date("end_date", &self.end_date)
    }

    pub fn to_query(&self) -> SearchQuery {
        let mut query = SearchQuery::filters_only()
            .start_date(self.start_date.clone())
            .end_date(self.end_date.clone())
            .limit(self.limit)
            .offset(self.offset)
            .response_format(self.response_format);
        query.query = self.query.clone();
        query
    }
}

/// Geographic origin search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeographicRequest {
    pub origin_place: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl GeographicRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_limit(self.limit)?;
        require("origin_place", &self.origin_place)
    }

    /// The place is also the free-text query unless one is given
    pub fn to_query(&self) -> SearchQuery {
        let text = self
            .query
            .clone()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| self.origin_place.clone());
        SearchQuery::new(text)
            .origin_place(self.origin_place.clone())
            .limit(self.limit)
            .offset(self.offset)
            .response_format(self.response_format)
    }
}

/// Multi-filter search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedSearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub origin_place: Option<String>,
    #[serde(default)]
    pub publication_place: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub format_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl AdvancedSearchRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_limit(self.limit)?;
        validate_optional_date("start_date", &self.start_date)?;
        validate_optional_date("end_date", &self.end_date)
    }

    /// First set value among query, title, author, subject and collection
    pub fn effective_query(&self) -> String {
        [
            &self.query,
            &self.title,
            &self.author,
            &self.subject,
            &self.collection,
        ]
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .cloned()
        .unwrap_or_default()
    }

    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            query: Some(self.effective_query()),
            title: self.title.clone(),
            author: self.author.clone(),
            subject: self.subject.clone(),
            collection: self.collection.clone(),
            origin_place: self.origin_place.clone(),
            publication_place: self.publication_place.clone(),
            language: self.language.clone(),
            format_type: self.format_type.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            limit: self.limit,
            offset: self.offset,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
            response_format: self.response_format,
        }
    }

    /// Human-readable list of the filters in use
    pub fn filter_summary(&self) -> Vec<String> {
        let labelled = [
            ("title", &self.title),
            ("author", &self.author),
            ("subject", &self.subject),
            ("collection", &self.collection),
            ("origin", &self.origin_place),
            ("pub place", &self.publication_place),
            ("language", &self.language),
            ("format", &self.format_type),
        ];

        let mut filters: Vec<String> = labelled
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("{}: {}", label, v))
            })
            .collect();

        let start = self.start_date.as_deref().filter(|v| !v.is_empty());
        let end = self.end_date.as_deref().filter(|v| !v.is_empty());
        if start.is_some() || end.is_some() {
            filters.push(format!(
                "date range: {} to {}",
                start.unwrap_or("earliest"),
                end.unwrap_or("latest")
            ));
        }

        filters
    }

    /// "<field> <order>" when a sort field is set
    pub fn sort_summary(&self) -> Option<String> {
        self.sort_by
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|field| format!("{} {}", field, self.sort_order.as_str()))
    }
}

/// Single record lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRequest {
    pub record_id: String,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl RecordRequest {
    pub fn validate(&self) -> Result<(), String> {
        require("record_id", &self.record_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseModsRequest {
    pub mods_xml: String,
}

/// Inputs searched for an Alma id, all optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermalinkRequest {
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub identifiers: Option<Map<String, Value>>,
    #[serde(default)]
    pub mods_xml: Option<String>,
    #[serde(default)]
    pub mods_dict: Option<Value>,
}
