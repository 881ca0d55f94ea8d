//! Known catalog collections.
//!
//! The upstream API has no endpoint for listing sets, so these are curated.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Collection {
    /// Upstream set name, usable as the `setName` filter
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const KNOWN_COLLECTIONS: [Collection; 5] = [
    Collection {
        id: "English_Crime_and_Execution_Broadsides",
        name: "English Crime and Execution Broadsides",
        description: "Collection of 18th-19th century English crime broadsides",
    },
    Collection {
        id: "Harvard_Graduate_School_of_Education",
        name: "Harvard Graduate School of Education Collection",
        description: "Materials from the Harvard Graduate School of Education",
    },
    Collection {
        id: "Women_Working_1800_1930",
        name: "Women Working, 1800-1930",
        description: "Collection focusing on women's roles in the economy",
    },
    Collection {
        id: "Latin_American_Pamphlets",
        name: "Latin American Pamphlets",
        description: "Historical pamphlets from Latin America",
    },
    Collection {
        id: "Harvard_Medical_School",
        name: "Harvard Medical School Collection",
        description: "Historical materials from Harvard Medical School",
    },
];

pub const COLLECTIONS_NOTE: &str = "This is a curated list of known collections. \
For a comprehensive list, consult Harvard Library documentation.";
