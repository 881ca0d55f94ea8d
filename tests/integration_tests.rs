//! Integration tests for Harvard Library MCP
//!
//! These tests run the client, the tool layer and the MCP registry against a
//! mocked catalog API.

use harvard_library_mcp::catalog::{CatalogClient, CatalogError};
use harvard_library_mcp::config::{load_config, Config};
use harvard_library_mcp::mcp::{McpServer, ToolRegistry};
use harvard_library_mcp::models::{ResponseFormat, SearchQuery};
use harvard_library_mcp::tools::{
    AdvancedSearchRequest, CatalogTools, DateRangeRequest, FieldSearchRequest, RecordRequest,
    SearchCatalogRequest,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;

fn mock_search_response() -> Value {
    json!({
        "items": {
            "item": [
                {
                    "id": "12345",
                    "titleInfo": {"title": "Test Book Title"},
                    "nameInfo": {"namePart": "Test Author"},
                    "originInfo": {"dateIssued": "2023", "publisher": "Test Publisher"},
                    "language": {"languageTerm": "eng"}
                }
            ]
        },
        "pagination": {"numFound": 1, "start": 0, "rows": 20}
    })
}

fn client_for(server: &ServerGuard) -> Arc<CatalogClient> {
    let mut config = Config::default();
    config.api.base_url = format!("{}/v2", server.url());
    config.rate_limits.requests_per_second = 100.0;
    Arc::new(CatalogClient::new(&config).unwrap())
}

async fn mock_search(server: &mut ServerGuard, body: Value) -> mockito::Mock {
    server
        .mock("GET", "/v2/items.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn test_search_basic() {
    let mut server = Server::new_async().await;
    let mock = mock_search(&mut server, mock_search_response()).await;

    let client = client_for(&server);
    let result = client
        .search(&SearchQuery::new("test query").limit(10))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.total_count, 1);
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].title.as_deref(), Some("Test Book Title"));
    assert_eq!(result.records[0].authors, vec!["Test Author".to_string()]);
    assert_eq!(result.records[0].publisher.as_deref(), Some("Test Publisher"));
    assert_eq!(result.records[0].language.as_deref(), Some("eng"));
    assert_eq!(result.limit, 10);
    assert!(!result.has_more);
}

#[tokio::test]
async fn test_search_with_filters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/items.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "test".into()),
            Matcher::UrlEncoded("name".into(), "test author".into()),
            Matcher::UrlEncoded("subject".into(), "test subject".into()),
            Matcher::UrlEncoded("setName".into(), "test collection".into()),
            Matcher::UrlEncoded("language".into(), "eng".into()),
        ]))
        .with_status(200)
        .with_body(json!({"items": {"item": []}, "pagination": {"numFound": 0}}).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let query = SearchQuery::new("test")
        .author("test author")
        .subject("test subject")
        .collection("test collection")
        .language("eng");
    let result = client.search(&query).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.total_count, 0);
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_get_record_by_id() {
    let mut server = Server::new_async().await;
    let record = mock_search_response()["items"]["item"][0].clone();
    let _mock = server
        .mock("GET", "/v2/items/12345.json")
        .with_status(200)
        .with_body(record.to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let record = client
        .get_record_by_id("12345", ResponseFormat::Json)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.id, "12345");
    assert_eq!(record.title.as_deref(), Some("Test Book Title"));
}

#[tokio::test]
async fn test_get_nonexistent_record() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v2/items/nonexistent.json")
        .with_status(404)
        .create_async()
        .await;

    let client = client_for(&server);
    let record = client
        .get_record_by_id("nonexistent", ResponseFormat::Json)
        .await
        .unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn test_error_handling() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v2/items.json")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.search(&SearchQuery::new("test")).await.unwrap_err();
    assert!(matches!(err, CatalogError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_xml_search() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v2/items.xml")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/xml")
        .with_body(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<results xmlns:mods="http://www.loc.gov/mods/v3">
  <pagination><numFound>42</numFound><limit>2</limit><start>0</start></pagination>
  <items>
    <mods:mods>
      <mods:titleInfo><mods:title>First Pamphlet</mods:title></mods:titleInfo>
      <mods:name><mods:namePart>Author One</mods:namePart></mods:name>
      <mods:recordInfo><mods:recordIdentifier>990011112220203941</mods:recordIdentifier></mods:recordInfo>
    </mods:mods>
    <mods:mods>
      <mods:titleInfo><mods:title>Second Pamphlet</mods:title></mods:titleInfo>
      <mods:subject><mods:topic>Broadsides</mods:topic></mods:subject>
    </mods:mods>
  </items>
</results>"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let query = SearchQuery::new("pamphlet")
        .limit(2)
        .response_format(ResponseFormat::Xml);
    let result = client.search(&query).await.unwrap();

    assert_eq!(result.total_count, 42);
    assert!(result.has_more);
    assert_eq!(result.records.len(), 2);

    let first = &result.records[0];
    assert_eq!(first.id, "990011112220203941");
    assert_eq!(first.title.as_deref(), Some("First Pamphlet"));
    assert_eq!(first.authors, vec!["Author One".to_string()]);
    assert_eq!(
        first.permalink.as_deref(),
        Some("https://id.lib.harvard.edu/alma/990011112220203941/catalog")
    );

    let second = &result.records[1];
    assert_eq!(second.subjects, vec!["Broadsides".to_string()]);
    assert!(!second.id.is_empty());
}

#[tokio::test]
async fn test_tool_envelopes() {
    let mut server = Server::new_async().await;
    let _mock = mock_search(&mut server, mock_search_response()).await;
    let tools = CatalogTools::new(client_for(&server));

    let req: SearchCatalogRequest = serde_json::from_value(json!({"query": "test"})).unwrap();
    let result = tools.search_catalog(&req).await;
    assert_eq!(result["success"], true);
    assert_eq!(result["total_count"], 1);
    assert_eq!(result["records"][0]["title"], "Test Book Title");
    assert!(result["search_time"].is_number());

    let result = tools
        .search_by_collection(&FieldSearchRequest::new("Latin_American_Pamphlets"))
        .await;
    assert_eq!(result["collection"], "Latin_American_Pamphlets");
    assert_eq!(result["has_more"], false);

    let req: DateRangeRequest = serde_json::from_value(json!({
        "start_date": "1850-01-01",
        "end_date": "1860-12-31"
    }))
    .unwrap();
    let result = tools.search_by_date_range(&req).await;
    assert_eq!(result["date_range"], "1850-01-01 to 1860-12-31");

    let req: AdvancedSearchRequest = serde_json::from_value(json!({
        "title": "Test",
        "language": "eng",
        "sort_by": "title"
    }))
    .unwrap();
    let result = tools.advanced_search(&req).await;
    assert_eq!(result["filters"], json!(["title: Test", "language: eng"]));
    assert_eq!(result["sort"], "title asc");
}

#[tokio::test]
async fn test_tool_error_envelopes() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/v2/items.json")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;
    let _record = server
        .mock("GET", "/v2/items/missing.json")
        .with_status(404)
        .create_async()
        .await;
    let tools = CatalogTools::new(client_for(&server));

    let result = tools
        .search_by_collection(&FieldSearchRequest::new("Harvard_Medical_School"))
        .await;
    assert_eq!(result["success"], false);
    assert_eq!(result["records"], json!([]));
    assert_eq!(result["total_count"], 0);
    assert_eq!(result["collection"], "Harvard_Medical_School");
    assert!(result["error"].as_str().unwrap().contains("503"));

    let result = tools
        .get_record_details(&RecordRequest {
            record_id: "missing".to_string(),
            response_format: ResponseFormat::Json,
        })
        .await;
    assert_eq!(result["success"], false);
    assert_eq!(result["error"], "Record missing not found");
    assert_eq!(result["record"], Value::Null);
}

#[tokio::test]
async fn test_registry_executes_search_tools() {
    let mut server = Server::new_async().await;
    let _mock = mock_search(&mut server, mock_search_response()).await;
    let registry = ToolRegistry::from_tools(CatalogTools::new(client_for(&server)));

    assert_eq!(registry.len(), 12);

    let result = registry
        .execute("search_by_title", json!({"title": "Test Book Title", "limit": 5}))
        .await
        .unwrap();
    assert_eq!(result["success"], true);
    assert_eq!(result["limit"], 5);

    let err = registry
        .execute("search_by_title", json!({"limit": 500, "title": "x"}))
        .await
        .unwrap_err();
    assert!(err.contains("limit"), "{}", err);

    let err = registry
        .execute("search_by_date_range", json!({"start_date": "1850", "end_date": "1860-01-01"}))
        .await
        .unwrap_err();
    assert!(err.contains("start_date"), "{}", err);
}

#[test]
fn test_mcp_server_creation() {
    let client = CatalogClient::new(&Config::default()).unwrap();
    let server = McpServer::new(CatalogTools::new(Arc::new(client)));
    assert!(server.is_ok());
}

#[test]
fn test_config_file_overrides_defaults() {
    let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(
        file,
        "[api]\nbase_url = \"https://example.org/v2\"\n\n[rate_limits]\nrequests_per_second = 2.5"
    )
    .unwrap();

    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.api.base_url, "https://example.org/v2");
    assert_eq!(config.rate_limits.requests_per_second, 2.5);
    assert_eq!(config.rate_limits.burst_size, 20);

    let client = CatalogClient::new(&config).unwrap();
    assert_eq!(client.rate_limiter().requests_per_second(), 2.5);
}
