//! Core data models for catalog records and search operations.

mod mods;
mod record;
mod search;

pub use mods::{BibliographicMetadata, MetadataSummary, MODS_NAMESPACE};
pub(crate) use mods::{attribute_of, insert_folding, items, text_of};
pub use record::{classify_identifier, CatalogRecord, SearchResult};
pub use search::{ResponseFormat, SearchQuery, SortOrder};
