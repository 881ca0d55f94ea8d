//! Catalog permalinks derived from Alma identifiers.

use regex::Regex;
use std::sync::OnceLock;

/// Base of the public catalog permalink
pub const PERMALINK_BASE: &str = "https://id.lib.harvard.edu/alma";

static ALMA_ID: OnceLock<Option<Regex>> = OnceLock::new();

fn alma_pattern() -> Option<&'static Regex> {
    ALMA_ID.get_or_init(|| Regex::new(r"99\d{8,}").ok()).as_ref()
}

/// First Alma-style id ("99" followed by at least 8 digits) in `text`
pub fn find_alma_id(text: &str) -> Option<String> {
    alma_pattern()?
        .find(text)
        .map(|m| m.as_str().to_string())
}

/// First Alma id across candidate texts, tried in order
pub fn first_alma_id<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates.into_iter().find_map(find_alma_id)
}

/// Permalink for an Alma id
pub fn permalink_url(alma_id: &str) -> String {
    format!("{}/{}/catalog", PERMALINK_BASE, alma_id)
}
