//! HTTP/REST mirror of the catalog tools.
//!
//! Every route returns the same JSON envelope as the matching MCP tool. Bad input
//! is rejected with 422 and `{"detail": ...}`.

mod error;

pub use error::{ApiError, ApiResult, ErrorResponse};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::mcp::SERVER_NAME;
use crate::models::ResponseFormat;
use crate::tools::{
    AdvancedSearchRequest, CatalogTools, DateRangeRequest, FieldSearchRequest, GeographicRequest,
    ParseModsRequest, RecordRequest, SearchCatalogRequest, SearchField, DEFAULT_LIMIT,
};

/// Build the router with all routes
pub fn router(tools: CatalogTools) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/search", get(simple_search).post(search))
        .route("/search/title", get(simple_title_search).post(search_title))
        .route("/search/author", get(simple_author_search).post(search_author))
        .route("/search/subject", post(search_subject))
        .route("/search/collection", post(search_collection))
        .route("/search/date-range", post(search_date_range))
        .route("/search/geographic", post(search_geographic))
        .route("/search/advanced", post(advanced_search))
        .route("/record/:record_id", get(get_record))
        .route("/collections", get(get_collections))
        .route("/parse/mods", post(parse_mods))
        .with_state(tools)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve the REST mirror until Ctrl-C
pub async fn serve(tools: CatalogTools, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("REST server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(tools))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down REST server");
}

/// Run a tool on its own task so a panic becomes a 500
async fn run_tool<F>(task: F) -> ApiResult<Json<Value>>
where
    F: Future<Output = Value> + Send + 'static,
{
    tokio::spawn(task)
        .await
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// Query string of the simple GET searches
#[derive(Debug, Deserialize)]
struct SimpleSearchParams {
    q: Option<String>,
    title: Option<String>,
    author: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    format: ResponseFormat,
}

impl SimpleSearchParams {
    fn required(value: &Option<String>, name: &str) -> ApiResult<String> {
        value
            .clone()
            .ok_or_else(|| ApiError::Validation(format!("Missing query parameter '{}'", name)))
    }

    fn field_request(&self, value: String) -> ApiResult<FieldSearchRequest> {
        let mut req = FieldSearchRequest::new(value)
            .limit(self.limit)
            .offset(self.offset);
        req.response_format = self.format;
        req.validate().map_err(ApiError::Validation)?;
        Ok(req)
    }
}

#[derive(Debug, Deserialize)]
struct RecordParams {
    #[serde(default)]
    response_format: ResponseFormat,
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Harvard Library MCP Server",
        "version": crate::VERSION,
        "description": "HTTP API for Harvard University Library catalog search",
        "endpoints": {
            "search": "/search",
            "search_title": "/search/title",
            "search_author": "/search/author",
            "search_subject": "/search/subject",
            "search_collection": "/search/collection",
            "search_date_range": "/search/date-range",
            "search_geographic": "/search/geographic",
            "advanced_search": "/search/advanced",
            "record": "/record/{record_id}",
            "collections": "/collections",
            "parse_mods": "/parse/mods",
            "health": "/health"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVER_NAME,
        "version": crate::VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn search(
    State(tools): State<CatalogTools>,
    body: Result<Json<SearchCatalogRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    req.validate().map_err(ApiError::Validation)?;
    run_tool(async move { tools.search_catalog(&req).await }).await
}

async fn field_search(
    tools: CatalogTools,
    field: SearchField,
    body: Result<Json<FieldSearchRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    req.validate().map_err(ApiError::Validation)?;
    run_field_search(tools, field, req).await
}

async fn run_field_search(
    tools: CatalogTools,
    field: SearchField,
    req: FieldSearchRequest,
) -> ApiResult<Json<Value>> {
    run_tool(async move {
        match field {
            SearchField::Title => tools.search_by_title(&req).await,
            SearchField::Author => tools.search_by_author(&req).await,
            SearchField::Subject => tools.search_by_subject(&req).await,
            SearchField::Collection => tools.search_by_collection(&req).await,
        }
    })
    .await
}

async fn search_title(
    State(tools): State<CatalogTools>,
    body: Result<Json<FieldSearchRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    field_search(tools, SearchField::Title, body).await
}

async fn search_author(
    State(tools): State<CatalogTools>,
    body: Result<Json<FieldSearchRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    field_search(tools, SearchField::Author, body).await
}

async fn search_subject(
    State(tools): State<CatalogTools>,
    body: Result<Json<FieldSearchRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    field_search(tools, SearchField::Subject, body).await
}

async fn search_collection(
    State(tools): State<CatalogTools>,
    body: Result<Json<FieldSearchRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    field_search(tools, SearchField::Collection, body).await
}

async fn search_date_range(
    State(tools): State<CatalogTools>,
    body: Result<Json<DateRangeRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    req.validate().map_err(ApiError::Validation)?;
    run_tool(async move { tools.search_by_date_range(&req).await }).await
}

async fn search_geographic(
    State(tools): State<CatalogTools>,
    body: Result<Json<GeographicRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    req.validate().map_err(ApiError::Validation)?;
    run_tool(async move { tools.search_by_geographic_origin(&req).await }).await
}

async fn advanced_search(
    State(tools): State<CatalogTools>,
    body: Result<Json<AdvancedSearchRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    req.validate().map_err(ApiError::Validation)?;
    run_tool(async move { tools.advanced_search(&req).await }).await
}

async fn get_record(
    State(tools): State<CatalogTools>,
    Path(record_id): Path<String>,
    params: Result<Query<RecordParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params?;
    let req = RecordRequest {
        record_id,
        response_format: params.response_format,
    };
    req.validate().map_err(ApiError::Validation)?;
    run_tool(async move { tools.get_record_details(&req).await }).await
}

async fn get_collections(State(tools): State<CatalogTools>) -> Json<Value> {
    Json(tools.get_collections_list())
}

async fn parse_mods(
    State(tools): State<CatalogTools>,
    body: Result<Json<ParseModsRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    run_tool(async move { tools.parse_mods_metadata(&req) }).await
}

async fn simple_search(
    State(tools): State<CatalogTools>,
    params: Result<Query<SimpleSearchParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params?;
    let req = SearchCatalogRequest {
        query: SimpleSearchParams::required(&params.q, "q")?,
        limit: params.limit,
        offset: params.offset,
        response_format: params.format,
    };
    req.validate().map_err(ApiError::Validation)?;
    run_tool(async move { tools.search_catalog(&req).await }).await
}

async fn simple_title_search(
    State(tools): State<CatalogTools>,
    params: Result<Query<SimpleSearchParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params?;
    let req = params.field_request(SimpleSearchParams::required(&params.title, "title")?)?;
    run_field_search(tools, SearchField::Title, req).await
}

async fn simple_author_search(
    State(tools): State<CatalogTools>,
    params: Result<Query<SimpleSearchParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params?;
    let req = params.field_request(SimpleSearchParams::required(&params.author, "author")?)?;
    run_field_search(tools, SearchField::Author, req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogClient;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_for(base_url: &str) -> Router {
        let mut config = Config::default();
        config.api.base_url = base_url.to_string();
        let client = CatalogClient::new(&config).unwrap();
        router(CatalogTools::new(Arc::new(client)))
    }

    fn app() -> Router {
        app_for("https://api.lib.harvard.edu/v2")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "harvard-library-mcp");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let (status, body) = send(app(), get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"]["record"], "/record/{record_id}");
    }

    #[tokio::test]
    async fn test_collections() {
        let (status, body) = send(app(), get_request("/collections")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collections"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_parse_mods() {
        let request = post_json(
            "/parse/mods",
            json!({"mods_xml": "<mods><titleInfo><title>Test Book Title</title></titleInfo></mods>"}),
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["parsed_metadata"]["title"], "Test Book Title");
    }

    #[tokio::test]
    async fn test_validation_errors_are_422() {
        let (status, body) = send(app(), get_request("/search")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "Missing query parameter 'q'");

        let (status, _) = send(app(), get_request("/search?q=x&limit=0")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(app(), get_request("/search?q=x&format=yaml")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let request = post_json(
            "/search/date-range",
            json!({"start_date": "1850", "end_date": "1860-01-01"}),
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("start_date"));

        let (status, _) = send(app(), post_json("/search", json!({"limit": 5}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let request = post_json("/search/advanced", json!({"sort_order": "sideways"}));
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_post_field_search_uses_field_value() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/items.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("setName".into(), "Latin_American_Pamphlets".into()),
                Matcher::UrlEncoded("limit".into(), "3".into()),
            ]))
            .with_status(200)
            .with_body(json!({"pagination": {"numFound": 0}, "items": []}).to_string())
            .create_async()
            .await;

        let request = post_json(
            "/search/collection",
            json!({"field_value": "Latin_American_Pamphlets", "limit": 3}),
        );
        let (status, body) = send(app_for(&server.url()), request).await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["collection"], "Latin_American_Pamphlets");
        assert_eq!(body["total_count"], 0);
    }

    #[tokio::test]
    async fn test_simple_author_search() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/items.json")
            .match_query(Matcher::UrlEncoded("name".into(), "Melville".into()))
            .with_status(200)
            .with_body(
                json!({
                    "pagination": {"numFound": 1},
                    "items": {"mods": {"titleInfo": {"title": "Moby Dick"}}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (status, body) = send(
            app_for(&server.url()),
            get_request("/search/author?author=Melville&limit=5"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["records"][0]["title"], "Moby Dick");
        assert_eq!(body["limit"], 5);
    }

    #[tokio::test]
    async fn test_record_not_found_envelope() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/items/nothing.json")
            .with_status(404)
            .create_async()
            .await;

        let (status, body) = send(app_for(&server.url()), get_request("/record/nothing")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Record nothing not found");
        assert_eq!(body["record"], Value::Null);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_error_envelope() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/items.json")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let (status, body) = send(app_for(&server.url()), get_request("/search?q=x")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["records"], json!([]));
        assert_eq!(body["total_count"], 0);
        assert!(body["error"].as_str().unwrap().contains("500"));
    }
}
