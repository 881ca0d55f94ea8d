//! Small text helpers.

use std::collections::BTreeMap;

const ISBN_KEYS: [&str; 6] = ["ISBN", "isbn", "isbn13", "isbn10", "ISBN-13", "ISBN-10"];

/// Find an ISBN in an identifier map.
///
/// Hyphens and spaces are stripped; only 10- or 13-character values are accepted.
pub fn extract_isbn(identifiers: &BTreeMap<String, String>) -> Option<String> {
    ISBN_KEYS.iter().find_map(|key| {
        let value = identifiers.get(*key)?;
        let cleaned: String = value
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect();
        matches!(cleaned.len(), 10 | 13).then_some(cleaned)
    })
}

/// Truncate text to `max_length` characters, ending with `suffix` when cut
pub fn truncate_text(text: &str, max_length: usize, suffix: &str) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let keep = max_length.saturating_sub(suffix.chars().count());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(suffix);
    truncated
}
