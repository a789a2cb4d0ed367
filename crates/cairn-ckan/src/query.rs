//! Canonical search request → Solr-style `q` / `fq` strings.

use cairn_core::search::{FieldFilter, SearchRequest};

/// Escape Solr query syntax characters so user input is matched
/// literally.
pub(crate) fn escape_solr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '+' | '-' | '!' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '"' | '~' | '*' | '?'
                | ':' | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Free-text query string; `*:*` matches everything.
pub(crate) fn build_q(term: Option<&str>) -> String {
    match term {
        Some(t) if !t.is_empty() => escape_solr(t),
        _ => "*:*".to_string(),
    }
}

/// Filter-query string: `field:value` clauses joined with ` AND `.
/// Values are escaped; field names are caller-controlled identifiers.
pub(crate) fn build_fq(filters: &[FieldFilter]) -> String {
    filters
        .iter()
        .map(|f| format!("{}:{}", f.field, escape_solr(&f.value)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

pub(crate) fn search_payload(request: &SearchRequest, filters: &[FieldFilter]) -> serde_json::Value {
    serde_json::json!({
        "q": build_q(request.term.as_deref()),
        "fq": build_fq(filters),
        "rows": request.limit,
        "start": request.offset,
        "sort": request.sort,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solr_specials_are_escaped() {
        assert_eq!(escape_solr("a+b"), "a\\+b");
        assert_eq!(escape_solr("what?"), "what\\?");
        assert_eq!(escape_solr("id:123"), "id\\:123");
        assert_eq!(escape_solr("plain"), "plain");
    }

    #[test]
    fn empty_term_matches_everything() {
        assert_eq!(build_q(None), "*:*");
        assert_eq!(build_q(Some("")), "*:*");
        assert_eq!(build_q(Some("climate")), "climate");
    }

    #[test]
    fn filters_join_with_and() {
        let filters = vec![
            FieldFilter::new("owner_org", "b2a1f9e0"),
            FieldFilter::new("state", "active"),
        ];
        assert_eq!(build_fq(&filters), "owner_org:b2a1f9e0 AND state:active");
    }

    #[test]
    fn search_payload_carries_pagination_and_sort() {
        let request = SearchRequest {
            term: Some("climate".into()),
            limit: 25,
            offset: 50,
            ..Default::default()
        };
        let payload = search_payload(&request, &request.filters);
        assert_eq!(payload["q"], "climate");
        assert_eq!(payload["rows"], 25);
        assert_eq!(payload["start"], 50);
        assert_eq!(payload["sort"], "score desc, metadata_modified desc");
    }
}
