//! Backend-neutral search request and result types.
//!
//! Each adapter translates these into its backend's native query form:
//! Solr-style query/filter strings for CKAN, field/regex predicate
//! documents for MongoDB. Translation is a pure function of the request;
//! adapters hold no per-call translation state.

use serde::{Deserialize, Serialize};

use crate::models::package::Package;
use crate::models::resource::Resource;

/// Default sort order, passed verbatim to CKAN. The MongoDB adapter
/// maps it to the nearest field/direction pair (`score` has no analog
/// there and falls back to `metadata_modified` descending).
pub const DEFAULT_SORT: &str = "score desc, metadata_modified desc";

pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_RESOURCE_LIMIT: u64 = 100;

/// One exact-match predicate, e.g. `owner_org:services`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Parse a `"field:value"` string. The value keeps any further
    /// colons; surrounding double quotes are stripped.
    pub fn parse(raw: &str) -> Option<Self> {
        let (field, value) = raw.split_once(':')?;
        let field = field.trim();
        let value = value.trim().trim_matches('"');
        if field.is_empty() {
            return None;
        }
        Some(Self::new(field, value))
    }
}

/// Canonical package search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text term. `None` matches everything.
    pub term: Option<String>,
    /// Exact-match filters, ANDed together.
    pub filters: Vec<FieldFilter>,
    pub limit: u64,
    pub offset: u64,
    pub sort: String,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            term: None,
            filters: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort: DEFAULT_SORT.to_string(),
        }
    }
}

impl SearchRequest {
    pub fn with_term(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Default::default()
        }
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(FieldFilter::new(field, value));
        self
    }

    /// Add every parseable `"field:value"` entry; malformed entries are
    /// ignored, matching CKAN's forgiving `fq` handling.
    pub fn filter_list<I, S>(mut self, raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filters
            .extend(raw.into_iter().filter_map(|s| FieldFilter::parse(s.as_ref())));
        self
    }
}

/// Canonical search result. Zero matches is success, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub count: u64,
    pub results: Vec<Package>,
}

/// Resource search request. The named fields are individual predicates
/// (partial match except `format`, which matches exactly,
/// case-insensitively).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceQuery {
    /// Free-text term. How wide it reaches is backend-defined: the
    /// document store matches it against name, url, and description,
    /// while CKAN's `resource_search` can only match it on name. Use
    /// the named fields where cross-backend parity matters.
    pub term: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub format: Option<String>,
    pub description: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for ResourceQuery {
    fn default() -> Self {
        Self {
            term: None,
            name: None,
            url: None,
            format: None,
            description: None,
            limit: DEFAULT_RESOURCE_LIMIT,
            offset: 0,
        }
    }
}

/// One resource match, carrying denormalized parent context so callers
/// can render results without a second round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceHit {
    #[serde(flatten)]
    pub resource: Resource,
    pub dataset_id: String,
    pub dataset_name: String,
    pub dataset_title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceResults {
    pub count: u64,
    pub results: Vec<ResourceHit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_backend() {
        let request = SearchRequest::default();
        assert_eq!(request.limit, 10);
        assert_eq!(request.offset, 0);
        assert_eq!(request.sort, "score desc, metadata_modified desc");
        assert!(request.term.is_none());
        assert!(request.filters.is_empty());
    }

    #[test]
    fn filter_parse_splits_on_first_colon() {
        let filter = FieldFilter::parse("url:https://example.org/data").unwrap();
        assert_eq!(filter.field, "url");
        assert_eq!(filter.value, "https://example.org/data");
    }

    #[test]
    fn filter_parse_strips_quotes_and_whitespace() {
        let filter = FieldFilter::parse(" owner_org : \"services\" ").unwrap();
        assert_eq!(filter.field, "owner_org");
        assert_eq!(filter.value, "services");
    }

    #[test]
    fn filter_parse_rejects_malformed_entries() {
        assert!(FieldFilter::parse("no-colon-here").is_none());
        assert!(FieldFilter::parse(":value-only").is_none());
    }

    #[test]
    fn filter_list_skips_malformed_entries() {
        let request = SearchRequest::default().filter_list(["state:active", "garbage"]);
        assert_eq!(request.filters.len(), 1);
        assert_eq!(request.filters[0], FieldFilter::new("state", "active"));
    }
}
