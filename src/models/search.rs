//! Search request models.

use serde::{Deserialize, Serialize};

/// Sort order for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("Invalid sort order '{}', expected 'asc' or 'desc'", other)),
        }
    }
}

/// Body encoding requested from the upstream API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    /// File extension used in upstream endpoint names
    pub fn extension(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
        }
    }
}

impl std::str::FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ResponseFormat::Json),
            "xml" => Ok(ResponseFormat::Xml),
            other => Err(format!(
                "Invalid response format '{}', expected 'json' or 'xml'",
                other
            )),
        }
    }
}

impl std::fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Catalog search parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// General free-text query
    pub query: Option<String>,

    pub title: Option<String>,

    /// Author or other name associated with the record
    pub author: Option<String>,

    pub subject: Option<String>,

    /// Upstream set name
    pub collection: Option<String>,

    pub origin_place: Option<String>,

    pub publication_place: Option<String>,

    pub language: Option<String>,

    /// Resource type (e.g. "text", "still image")
    pub format_type: Option<String>,

    /// Start of the requested date range (only one date reaches the upstream)
    pub start_date: Option<String>,

    pub end_date: Option<String>,

    /// Maximum number of results to return
    pub limit: usize,

    /// Number of results to skip
    pub offset: usize,

    pub sort_by: Option<String>,

    pub sort_order: SortOrder,

    pub response_format: ResponseFormat,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: None,
            title: None,
            author: None,
            subject: None,
            collection: None,
            origin_place: None,
            publication_place: None,
            language: None,
            format_type: None,
            start_date: None,
            end_date: None,
            limit: 20,
            offset: 0,
            sort_by: None,
            sort_order: SortOrder::Asc,
            response_format: ResponseFormat::Json,
        }
    }
}

impl SearchQuery {
    /// Create a new search query with a free-text term
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Create a search query with no free-text term (filters only)
    pub fn filters_only() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn origin_place(mut self, place: impl Into<String>) -> Self {
        self.origin_place = Some(place.into());
        self
    }

    pub fn publication_place(mut self, place: impl Into<String>) -> Self {
        self.publication_place = Some(place.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn format_type(mut self, format_type: impl Into<String>) -> Self {
        self.format_type = Some(format_type.into());
        self
    }

    pub fn start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    pub fn end_date(mut self, date: impl Into<String>) -> Self {
        self.end_date = Some(date.into());
        self
    }

    /// Set maximum results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set pagination offset
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = order;
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    /// The single date the upstream understands.
    ///
    /// The API has no range filter: with both bounds only the start is sent.
    pub fn date_filter(&self) -> Option<&str> {
        non_empty(&self.start_date).or_else(|| non_empty(&self.end_date))
    }

    /// Upstream query parameters, in a stable order, skipping unset filters
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("start", self.offset.to_string()),
        ];

        let filters: [(&'static str, &Option<String>); 9] = [
            ("q", &self.query),
            ("title", &self.title),
            ("name", &self.author),
            ("subject", &self.subject),
            ("setName", &self.collection),
            ("originPlace", &self.origin_place),
            ("pubPlace", &self.publication_place),
            ("language", &self.language),
            ("resourceType", &self.format_type),
        ];
        for (key, value) in filters {
            if let Some(value) = non_empty(value) {
                params.push((key, value.to_string()));
            }
        }

        if let Some(date) = self.date_filter() {
            params.push(("dateIssued", date.to_string()));
        }

        if let Some(sort) = non_empty(&self.sort_by) {
            params.push(("sort", sort.to_string()));
            if self.sort_order == SortOrder::Desc {
                params.push(("sortDirection", "descending".to_string()));
            }
        }

        params
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_defaults() {
        let query = SearchQuery::new("whaling");
        assert_eq!(query.limit, 20);
        assert_eq!(query.offset, 0);
        assert_eq!(query.sort_order, SortOrder::Asc);
        assert_eq!(query.response_format, ResponseFormat::Json);
    }

    #[test]
    fn test_params_skip_unset_filters() {
        let params = SearchQuery::new("whaling").limit(5).offset(10).to_params();
        assert_eq!(param(&params, "q"), Some("whaling"));
        assert_eq!(param(&params, "limit"), Some("5"));
        assert_eq!(param(&params, "start"), Some("10"));
        assert_eq!(param(&params, "title"), None);
        assert_eq!(param(&params, "dateIssued"), None);
        assert_eq!(param(&params, "sort"), None);
    }

    #[test]
    fn test_field_parameter_names() {
        let params = SearchQuery::filters_only()
            .title("Moby Dick")
            .author("Melville")
            .subject("Whaling")
            .collection("Latin_American_Pamphlets")
            .origin_place("Boston")
            .publication_place("New York")
            .language("eng")
            .format_type("text")
            .to_params();

        assert_eq!(param(&params, "q"), None);
        assert_eq!(param(&params, "title"), Some("Moby Dick"));
        assert_eq!(param(&params, "name"), Some("Melville"));
        assert_eq!(param(&params, "subject"), Some("Whaling"));
        assert_eq!(param(&params, "setName"), Some("Latin_American_Pamphlets"));
        assert_eq!(param(&params, "originPlace"), Some("Boston"));
        assert_eq!(param(&params, "pubPlace"), Some("New York"));
        assert_eq!(param(&params, "language"), Some("eng"));
        assert_eq!(param(&params, "resourceType"), Some("text"));
    }

    #[test]
    fn test_date_filter_only_sends_one_date() {
        let both = SearchQuery::filters_only()
            .start_date("1850-01-01")
            .end_date("1860-12-31");
        assert_eq!(both.date_filter(), Some("1850-01-01"));

        let end_only = SearchQuery::filters_only().end_date("1860-12-31");
        assert_eq!(end_only.date_filter(), Some("1860-12-31"));
        let params = end_only.to_params();
        assert_eq!(param(&params, "dateIssued"), Some("1860-12-31"));

        let start_only = SearchQuery::filters_only().start_date("1850");
        assert_eq!(start_only.date_filter(), Some("1850"));
    }

    #[test]
    fn test_sort_direction() {
        let asc = SearchQuery::new("x").sort_by("title", SortOrder::Asc).to_params();
        assert_eq!(param(&asc, "sort"), Some("title"));
        assert_eq!(param(&asc, "sortDirection"), None);

        let desc = SearchQuery::new("x").sort_by("date", SortOrder::Desc).to_params();
        assert_eq!(param(&desc, "sort"), Some("date"));
        assert_eq!(param(&desc, "sortDirection"), Some("descending"));
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("XML".parse::<ResponseFormat>().unwrap(), ResponseFormat::Xml);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("yaml".parse::<ResponseFormat>().is_err());
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
