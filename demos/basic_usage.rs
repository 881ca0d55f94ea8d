//! Basic usage example for the Harvard Library MCP library.
//!
//! Searches the catalog directly, then runs a tool call the way an MCP
//! client would see it.

use harvard_library_mcp::config::Config;
use harvard_library_mcp::models::{ResponseFormat, SearchQuery, SortOrder};
use harvard_library_mcp::tools::{CatalogTools, FieldSearchRequest};
use harvard_library_mcp::CatalogClient;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Arc::new(CatalogClient::new(&Config::default())?);
    println!("Using catalog API at {}\n", client.base_url());

    // Structured search with a subject filter and a date window
    let query = SearchQuery::new("whaling")
        .subject("Whaling")
        .start_date("1800-01-01")
        .end_date("1900-12-31")
        .sort_by("title", SortOrder::Asc)
        .limit(5);

    let result = client.search(&query).await?;
    println!(
        "Found {} matching records ({} shown)",
        result.total_count,
        result.len()
    );

    for (i, record) in result.records.iter().enumerate() {
        println!("\n{}. {}", i + 1, record.display_title());
        if !record.authors.is_empty() {
            println!("   Authors: {}", record.authors_string());
        }
        if let Some(date) = &record.publication_date {
            println!("   Date: {}", date);
        }
        if let Some(permalink) = &record.permalink {
            println!("   Permalink: {}", permalink);
        }
    }

    // Full record in MODS XML form
    if let Some(first) = result.records.first() {
        match client.get_record_by_id(&first.id, ResponseFormat::Xml).await? {
            Some(record) => println!("\nRecord {} has {} subjects", record.id, record.subjects.len()),
            None => println!("\nRecord {} not found", first.id),
        }
    }

    // The same catalog through the tool layer
    let tools = CatalogTools::new(client);
    let envelope = tools
        .search_by_author(&FieldSearchRequest::new("Melville, Herman").limit(3))
        .await;
    println!("\n{}", serde_json::to_string_pretty(&envelope)?);

    Ok(())
}
