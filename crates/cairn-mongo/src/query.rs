//! Canonical search request → MongoDB predicate documents.
//!
//! Translation is a pure function of the (already owner-resolved)
//! request, so it is shared safely across concurrent calls.

use bson::{Document, doc};
use cairn_core::search::{FieldFilter, ResourceQuery};

fn contains(pattern: &str) -> Document {
    doc! { "$regex": regex::escape(pattern), "$options": "i" }
}

/// Free-text term: case-insensitive substring match ORed across the
/// package text fields.
pub(crate) fn package_term_clause(term: &str) -> Document {
    doc! {
        "$or": [
            { "title": contains(term) },
            { "notes": contains(term) },
            { "name": contains(term) },
        ]
    }
}

/// Combined package predicate: term clause ANDed with exact-match
/// field filters.
pub(crate) fn package_filter(term: Option<&str>, filters: &[FieldFilter]) -> Document {
    let mut filter = match term {
        Some(t) if !t.is_empty() => package_term_clause(t),
        _ => Document::new(),
    };
    for f in filters {
        filter.insert(f.field.clone(), f.value.clone());
    }
    filter
}

/// CKAN-style sort string → Mongo sort document. `score` has no analog
/// here and is dropped; an empty result falls back to most recently
/// modified first.
pub(crate) fn translate_sort(sort: &str) -> Document {
    let mut translated = Document::new();
    for item in sort.split(',') {
        let mut parts = item.split_whitespace();
        let Some(field) = parts.next() else { continue };
        if field == "score" {
            continue;
        }
        let direction = match parts.next() {
            Some(d) if d.eq_ignore_ascii_case("asc") => 1,
            _ => -1,
        };
        translated.insert(field, direction);
    }
    if translated.is_empty() {
        translated.insert("metadata_modified", -1);
    }
    translated
}

/// The driver takes an `i64` limit; clamp rather than wrap a huge
/// caller-supplied value negative (a negative limit means "last N"
/// to the server).
pub(crate) fn clamp_limit(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Resource predicate: partial matches on name/url/description, exact
/// (case-insensitive) format, term ORed across the text fields.
pub(crate) fn resource_filter(query: &ResourceQuery) -> Document {
    let mut filter = Document::new();
    if let Some(term) = query.term.as_deref().filter(|t| !t.is_empty()) {
        filter.insert(
            "$or",
            vec![
                doc! { "name": contains(term) },
                doc! { "url": contains(term) },
                doc! { "description": contains(term) },
            ],
        );
    }
    if let Some(name) = &query.name {
        filter.insert("name", contains(name));
    }
    if let Some(url) = &query.url {
        filter.insert("url", contains(url));
    }
    if let Some(description) = &query.description {
        filter.insert("description", contains(description));
    }
    if let Some(format) = &query.format {
        filter.insert(
            "format",
            doc! { "$regex": format!("^{}$", regex::escape(format)), "$options": "i" },
        );
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_matches_across_text_fields() {
        let clause = package_term_clause("climate");
        let alternatives = clause.get_array("$or").unwrap();
        assert_eq!(alternatives.len(), 3);
    }

    #[test]
    fn regex_input_is_escaped() {
        let clause = package_term_clause("c++ (v2)?");
        let rendered = clause.to_string();
        assert!(rendered.contains("c\\+\\+"));
        assert!(rendered.contains("\\(v2\\)\\?"));
    }

    #[test]
    fn filters_are_exact_and_anded_with_term() {
        let filters = vec![
            FieldFilter::new("owner_org", "org-id-1"),
            FieldFilter::new("state", "active"),
        ];
        let filter = package_filter(Some("climate"), &filters);
        assert!(filter.contains_key("$or"));
        assert_eq!(filter.get_str("owner_org").unwrap(), "org-id-1");
        assert_eq!(filter.get_str("state").unwrap(), "active");
    }

    #[test]
    fn empty_request_matches_everything() {
        assert!(package_filter(None, &[]).is_empty());
    }

    #[test]
    fn default_sort_drops_score_and_keeps_modified_desc() {
        let sort = translate_sort("score desc, metadata_modified desc");
        assert_eq!(sort.len(), 1);
        assert_eq!(sort.get_i32("metadata_modified").unwrap(), -1);
    }

    #[test]
    fn score_only_sort_falls_back_to_modified_desc() {
        let sort = translate_sort("score desc");
        assert_eq!(sort.get_i32("metadata_modified").unwrap(), -1);
    }

    #[test]
    fn explicit_directions_are_translated() {
        let sort = translate_sort("name asc, metadata_created desc");
        assert_eq!(sort.get_i32("name").unwrap(), 1);
        assert_eq!(sort.get_i32("metadata_created").unwrap(), -1);
    }

    #[test]
    fn oversized_limit_clamps_instead_of_wrapping() {
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(u64::MAX), i64::MAX);
        assert_eq!(clamp_limit(i64::MAX as u64 + 1), i64::MAX);
    }

    #[test]
    fn resource_format_matches_exactly_case_insensitive() {
        let query = ResourceQuery {
            format: Some("CSV".into()),
            ..Default::default()
        };
        let filter = resource_filter(&query);
        let format = filter.get_document("format").unwrap();
        assert_eq!(format.get_str("$regex").unwrap(), "^CSV$");
        assert_eq!(format.get_str("$options").unwrap(), "i");
    }
}
