//! Tool handlers bridging MCP arguments to [`CatalogTools`].

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::tools::ToolHandler;
use crate::tools::{
    AdvancedSearchRequest, CatalogTools, DateRangeRequest, FieldSearchRequest, GeographicRequest,
    ParseModsRequest, PermalinkRequest, RecordRequest, SearchCatalogRequest, SearchField,
};

/// Deserialize tool arguments; absent arguments count as an empty object
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))
}

/// Handler for general catalog search
#[derive(Debug)]
pub struct SearchCatalogHandler {
    pub tools: CatalogTools,
}

#[async_trait::async_trait]
impl ToolHandler for SearchCatalogHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let req: SearchCatalogRequest = parse_args(args)?;
        req.validate()?;
        Ok(self.tools.search_catalog(&req).await)
    }
}

/// Handler for the single-field searches (title, author, subject, collection)
#[derive(Debug)]
pub struct FieldSearchHandler {
    pub tools: CatalogTools,
    pub field: SearchField,
}

#[async_trait::async_trait]
impl ToolHandler for FieldSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let req = FieldSearchRequest::from_args(self.field, &args)?;
        req.validate()?;

        let result = match self.field {
            SearchField::Title => self.tools.search_by_title(&req).await,
            SearchField::Author => self.tools.search_by_author(&req).await,
            SearchField::Subject => self.tools.search_by_subject(&req).await,
            SearchField::Collection => self.tools.search_by_collection(&req).await,
        };
        Ok(result)
    }
}

#[derive(Debug)]
pub struct DateRangeHandler {
    pub tools: CatalogTools,
}

#[async_trait::async_trait]
impl ToolHandler for DateRangeHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let req: DateRangeRequest = parse_args(args)?;
        req.validate()?;
        Ok(self.tools.search_by_date_range(&req).await)
    }
}

#[derive(Debug)]
pub struct GeographicHandler {
    pub tools: CatalogTools,
}

#[async_trait::async_trait]
impl ToolHandler for GeographicHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let req: GeographicRequest = parse_args(args)?;
        req.validate()?;
        Ok(self.tools.search_by_geographic_origin(&req).await)
    }
}

#[derive(Debug)]
pub struct AdvancedSearchHandler {
    pub tools: CatalogTools,
}

#[async_trait::async_trait]
impl ToolHandler for AdvancedSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let req: AdvancedSearchRequest = parse_args(args)?;
        req.validate()?;
        Ok(self.tools.advanced_search(&req).await)
    }
}

/// Handler for fetching one record
#[derive(Debug)]
pub struct RecordDetailsHandler {
    pub tools: CatalogTools,
}

#[async_trait::async_trait]
impl ToolHandler for RecordDetailsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let req: RecordRequest = parse_args(args)?;
        req.validate()?;
        Ok(self.tools.get_record_details(&req).await)
    }
}

#[derive(Debug)]
pub struct CollectionsHandler {
    pub tools: CatalogTools,
}

#[async_trait::async_trait]
impl ToolHandler for CollectionsHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        Ok(self.tools.get_collections_list())
    }
}

#[derive(Debug)]
pub struct ParseModsHandler {
    pub tools: CatalogTools,
}

#[async_trait::async_trait]
impl ToolHandler for ParseModsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let req: ParseModsRequest = parse_args(args)?;
        Ok(self.tools.parse_mods_metadata(&req))
    }
}

#[derive(Debug)]
pub struct PermalinkHandler {
    pub tools: CatalogTools,
}

#[async_trait::async_trait]
impl ToolHandler for PermalinkHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let req: PermalinkRequest = parse_args(args)?;
        Ok(self.tools.parse_permalink(&req))
    }
}
