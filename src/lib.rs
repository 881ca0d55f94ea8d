//! # Harvard Library MCP
//!
//! A Model Context Protocol (MCP) server, plus an HTTP/REST mirror, for searching
//! the Harvard Library bibliographic catalog.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (CatalogRecord, SearchQuery, MODS metadata)
//! - [`catalog`]: Upstream API client and record normalization
//! - [`tools`]: Tool layer shaping JSON result envelopes
//! - [`mcp`]: MCP protocol implementation and server
//! - [`rest`]: HTTP/REST mirror of the tool layer
//! - [`utils`]: HTTP client, rate limiting and text helpers
//! - [`config`]: Configuration management

pub mod catalog;
pub mod config;
pub mod mcp;
pub mod models;
pub mod rest;
pub mod tools;
pub mod utils;

// Re-export commonly used types
pub use catalog::{CatalogClient, CatalogError};
pub use models::{CatalogRecord, SearchQuery, SearchResult};
pub use tools::CatalogTools;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
