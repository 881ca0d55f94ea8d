//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use super::handlers::{
    AdvancedSearchHandler, CollectionsHandler, DateRangeHandler, FieldSearchHandler,
    GeographicHandler, ParseModsHandler, PermalinkHandler, RecordDetailsHandler,
    SearchCatalogHandler,
};
use crate::tools::{CatalogTools, SearchField, DEFAULT_LIMIT, MAX_LIMIT};

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_catalog")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

fn limit_schema() -> Value {
    json!({
        "type": "integer",
        "description": format!("Maximum number of results to return (1-{})", MAX_LIMIT),
        "minimum": 1,
        "maximum": MAX_LIMIT,
        "default": DEFAULT_LIMIT
    })
}

fn offset_schema() -> Value {
    json!({
        "type": "integer",
        "description": "Number of results to skip for pagination",
        "minimum": 0,
        "default": 0
    })
}

fn format_schema() -> Value {
    json!({
        "type": "string",
        "description": "Response format",
        "enum": ["json", "xml"],
        "default": "json"
    })
}

fn date_schema(which: &str) -> Value {
    json!({
        "type": "string",
        "description": format!("{} date in YYYY-MM-DD format", which),
        "pattern": "^\\d{4}-\\d{2}-\\d{2}$"
    })
}

/// Schema for a search keyed on one required string field
fn field_search_schema(field: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            field: {
                "type": "string",
                "description": description
            },
            "limit": limit_schema(),
            "offset": offset_schema(),
            "response_format": format_schema()
        },
        "required": [field]
    })
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry holding every catalog tool
    pub fn from_tools(tools: CatalogTools) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };
        registry.register_catalog_tools(&tools);
        registry
    }

    fn register_catalog_tools(&mut self, tools: &CatalogTools) {
        self.register(Tool {
            name: "search_catalog".to_string(),
            description: "Search the Harvard Library catalog with a general query".to_string(),
            input_schema: field_search_schema("query", "General search query string"),
            handler: Arc::new(SearchCatalogHandler {
                tools: tools.clone(),
            }),
        });

        let field_tools = [
            (
                SearchField::Title,
                "search_by_title",
                "Search the Harvard Library catalog by title",
                "Title search query",
            ),
            (
                SearchField::Author,
                "search_by_author",
                "Search the Harvard Library catalog by author",
                "Author search query",
            ),
            (
                SearchField::Subject,
                "search_by_subject",
                "Search the Harvard Library catalog by subject",
                "Subject search query",
            ),
            (
                SearchField::Collection,
                "search_by_collection",
                "Search within a specific Harvard Library collection",
                "Collection name or identifier (setName parameter)",
            ),
        ];
        for (field, name, description, field_description) in field_tools {
            self.register(Tool {
                name: name.to_string(),
                description: description.to_string(),
                input_schema: field_search_schema(field.as_str(), field_description),
                handler: Arc::new(FieldSearchHandler {
                    tools: tools.clone(),
                    field,
                }),
            });
        }

        self.register(Tool {
            name: "search_by_date_range".to_string(),
            description: "Search the Harvard Library catalog by publication date range".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "start_date": date_schema("Start"),
                    "end_date": date_schema("End"),
                    "query": {
                        "type": "string",
                        "description": "Optional additional search query"
                    },
                    "limit": limit_schema(),
                    "offset": offset_schema(),
                    "response_format": format_schema()
                },
                "required": ["start_date", "end_date"]
            }),
            handler: Arc::new(DateRangeHandler {
                tools: tools.clone(),
            }),
        });

        self.register(Tool {
            name: "search_by_geographic_origin".to_string(),
            description: "Search the Harvard Library catalog by geographic origin".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "origin_place": {
                        "type": "string",
                        "description": "Geographic origin place for filtering"
                    },
                    "query": {
                        "type": "string",
                        "description": "Optional additional search query"
                    },
                    "limit": limit_schema(),
                    "offset": offset_schema(),
                    "response_format": format_schema()
                },
                "required": ["origin_place"]
            }),
            handler: Arc::new(GeographicHandler {
                tools: tools.clone(),
            }),
        });

        let filter = |description: &str| json!({"type": "string", "description": description});
        self.register(Tool {
            name: "advanced_search".to_string(),
            description:
                "Perform advanced search with multiple filters on the Harvard Library catalog"
                    .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": filter("General search query"),
                    "title": filter("Title filter"),
                    "author": filter("Author filter"),
                    "subject": filter("Subject filter"),
                    "collection": filter("Collection filter"),
                    "origin_place": filter("Origin place filter"),
                    "publication_place": filter("Publication place filter"),
                    "language": filter("Language filter"),
                    "format_type": filter("Format type filter"),
                    "start_date": date_schema("Start"),
                    "end_date": date_schema("End"),
                    "limit": limit_schema(),
                    "offset": offset_schema(),
                    "sort_by": filter("Sort field"),
                    "sort_order": {
                        "type": "string",
                        "description": "Sort order",
                        "enum": ["asc", "desc"],
                        "default": "asc"
                    },
                    "response_format": format_schema()
                }
            }),
            handler: Arc::new(AdvancedSearchHandler {
                tools: tools.clone(),
            }),
        });

        self.register(Tool {
            name: "get_record_details".to_string(),
            description: "Get detailed information for a specific Harvard Library catalog record"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "record_id": {
                        "type": "string",
                        "description": "Unique identifier for the record"
                    },
                    "response_format": format_schema()
                },
                "required": ["record_id"]
            }),
            handler: Arc::new(RecordDetailsHandler {
                tools: tools.clone(),
            }),
        });

        self.register(Tool {
            name: "get_collections_list".to_string(),
            description: "Get a list of available Harvard Library collections".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(CollectionsHandler {
                tools: tools.clone(),
            }),
        });

        self.register(Tool {
            name: "parse_mods_metadata".to_string(),
            description: "Parse MODS XML metadata and extract structured information".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "mods_xml": {
                        "type": "string",
                        "description": "MODS XML content as string"
                    }
                },
                "required": ["mods_xml"]
            }),
            handler: Arc::new(ParseModsHandler {
                tools: tools.clone(),
            }),
        });

        self.register(Tool {
            name: "parse_permalink".to_string(),
            description: "Compute Harvard catalog permalink (alma) from identifiers or MODS"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "record_id": {"type": "string", "description": "Record identifier (optional)"},
                    "identifiers": {"type": "object", "description": "Identifiers map (optional)"},
                    "mods_xml": {"type": "string", "description": "MODS XML (optional)"},
                    "mods_dict": {"type": "object", "description": "MODS dict (optional)"}
                }
            }),
            handler: Arc::new(PermalinkHandler {
                tools: tools.clone(),
            }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools, ordered by name
    pub fn all(&self) -> Vec<&Tool> {
        let mut tools: Vec<&Tool> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Unknown tool: {}", name))?;

        tool.handler.execute(args).await
    }
}
