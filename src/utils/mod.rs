//! Utility modules supporting catalog operations.
//!
//! - [`HttpClient`]: Shared HTTP client configured from [`ApiConfig`](crate::config::ApiConfig)
//! - [`RateLimiter`]: Token-bucket limiter guarding outbound requests
//! - [`extract_isbn`]: Pick an ISBN out of an identifier map
//! - [`truncate_text`]: Shorten text for table output
//! - [`XmlElement`]: Owned, namespace-resolved XML element tree
//!
//! # Rate Limiting
//!
//! ```rust,no_run
//! use harvard_library_mcp::utils::RateLimiter;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let limiter = RateLimiter::new(10.0, 20);
//! limiter.acquire().await;
//! # }
//! ```

mod http;
mod rate_limit;
mod text;
mod xml;

pub use http::HttpClient;
pub use rate_limit::RateLimiter;
pub use text::{extract_isbn, truncate_text};
pub use xml::{XmlElement, XmlError};
