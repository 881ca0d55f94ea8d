//! Harvard Library catalog API client.
//!
//! [`CatalogClient`] turns a [`SearchQuery`] or a record id into one upstream
//! request, throttled by a shared [`RateLimiter`], and normalizes whatever comes
//! back into [`CatalogRecord`]s.
//!
//! ```rust,no_run
//! use harvard_library_mcp::config::Config;
//! use harvard_library_mcp::{CatalogClient, SearchQuery};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CatalogClient::new(&Config::default())?;
//! let result = client.search(&SearchQuery::new("whaling").limit(5)).await?;
//! for record in &result.records {
//!     println!("{}: {}", record.id, record.display_title());
//! }
//! client.close();
//! # Ok(())
//! # }
//! ```

mod normalize;
mod permalink;
mod response;
mod xml;

pub use normalize::{parse_record, record_identifiers, synthesized_id, RawRecord};
pub use permalink::{find_alma_id, first_alma_id, permalink_url, PERMALINK_BASE};
pub use response::{locate_detail, locate_records, total_count, unwrap_root};
pub use xml::xml_to_value;

use serde_json::Value;
use std::time::Instant;

use crate::config::Config;
use crate::models::{CatalogRecord, ResponseFormat, SearchQuery, SearchResult};
use crate::utils::{HttpClient, RateLimiter};

/// Errors from the catalog client
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Network or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status
    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}

impl CatalogError {
    /// Whether this is an upstream 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::Status { status: 404, .. })
    }
}

/// Client for the catalog API
#[derive(Debug)]
pub struct CatalogClient {
    base_url: String,
    http: HttpClient,
    rate_limiter: RateLimiter,
}

impl CatalogClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> Result<Self, CatalogError> {
        config
            .validate()
            .map_err(|e| CatalogError::InvalidConfig(e.to_string()))?;

        let http = HttpClient::new(&config.api)?;
        let rate_limiter = RateLimiter::new(
            config.rate_limits.requests_per_second,
            config.rate_limits.burst_size,
        );

        tracing::debug!(
            "Catalog client for {} ({} req/s, burst {})",
            config.api.base_url,
            config.rate_limits.requests_per_second,
            config.rate_limits.burst_size
        );

        Ok(Self {
            base_url: config.api.base_url.clone(),
            http,
            rate_limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Join the base URL and an endpoint with exactly one slash and append the
    /// URL-encoded query string
    pub fn build_url<K, V>(&self, endpoint: &str, params: &[(K, V)]) -> String
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );

        if !params.is_empty() {
            let query = params
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}={}",
                        urlencoding::encode(k.as_ref()),
                        urlencoding::encode(v.as_ref())
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }

        url
    }

    /// Issue one throttled GET and decode the body according to `format`
    async fn fetch<K, V>(
        &self,
        endpoint: &str,
        params: &[(K, V)],
        format: ResponseFormat,
    ) -> Result<Value, CatalogError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.rate_limiter.acquire().await;

        let url = self.build_url(endpoint, params);
        tracing::debug!("GET {}", url);

        let response = self.http.client().get(&url).send().await.map_err(|e| {
            tracing::error!("Request error for {}: {}", url, e);
            CatalogError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 404 {
                tracing::debug!("HTTP 404 for {}", url);
            } else {
                tracing::error!("HTTP error {}: {}", status.as_u16(), body);
            }
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        match format {
            ResponseFormat::Json => serde_json::from_str(&text).map_err(|e| {
                tracing::error!("Error parsing JSON response from {}: {}", url, e);
                CatalogError::from(e)
            }),
            ResponseFormat::Xml => Ok(xml_to_value(&text)),
        }
    }

    /// Search the catalog
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, CatalogError> {
        let started = Instant::now();
        let endpoint = format!("items.{}", query.response_format.extension());

        let data = self
            .fetch(&endpoint, &query.to_params(), query.response_format)
            .await
            .map_err(|e| {
                tracing::error!("Search request failed: {}", e);
                e
            })?;

        let total = total_count(&data);
        let mut records = Vec::new();
        for (index, raw) in locate_records(&data).into_iter().enumerate() {
            if !raw.is_object() {
                tracing::warn!("Skipping record {}: not an object", index);
                continue;
            }
            records.push(parse_record(&raw));
        }

        tracing::info!(
            "Search returned {} records ({} total)",
            records.len(),
            total
        );

        let mut result = SearchResult::new(records, total, query.limit, query.offset);
        result.search_time = Some(started.elapsed().as_secs_f64());
        result.raw_response = Some(data);
        Ok(result)
    }

    /// Fetch a single record. An upstream 404 is `Ok(None)`.
    pub async fn get_record_by_id(
        &self,
        record_id: &str,
        format: ResponseFormat,
    ) -> Result<Option<CatalogRecord>, CatalogError> {
        let endpoint = format!(
            "items/{}.{}",
            urlencoding::encode(record_id),
            format.extension()
        );

        let data = match self.fetch(&endpoint, &[] as &[(&str, &str)], format).await {
            Ok(data) => data,
            Err(e) if e.is_not_found() => {
                tracing::info!("Record {} not found", record_id);
                return Ok(None);
            }
            Err(e) => {
                tracing::error!("Error fetching record {}: {}", record_id, e);
                return Err(e);
            }
        };

        match locate_detail(&data) {
            Some(raw) => Ok(Some(parse_record(&raw))),
            None => {
                tracing::info!("Record {} not found in response body", record_id);
                Ok(None)
            }
        }
    }

    /// Release the client and its connection pool
    pub fn close(self) {
        tracing::debug!("Closing catalog client for {}", self.base_url);
        drop(self);
    }
}
