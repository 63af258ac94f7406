//! Request handlers
//!
//! Thin verb -> service composition. All access decisions live in the
//! gateway and the content service; handlers only parse and delegate.

pub mod attachments;
pub mod auth;
pub mod content;

use axum::response::Json;
use corpus_content::{FieldSelection, ListParams};
use corpus_core::{CorpusResult, Error};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Reject ids that could not have been issued by this system.
pub(crate) fn launder_id(raw: &str) -> CorpusResult<String> {
    let acceptable = !raw.is_empty()
        && raw.len() <= 128
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if acceptable {
        Ok(raw.to_string())
    } else {
        Err(Error::invalid())
    }
}

pub(crate) fn object_body(body: Value) -> CorpusResult<Map<String, Value>> {
    body.as_object().cloned().ok_or_else(Error::invalid)
}

pub(crate) fn list_params(query: &HashMap<String, String>) -> ListParams {
    ListParams {
        published_any: query.get("published").map(|v| v == "any").unwrap_or(false),
        per_page: query.get("perPage").and_then(|v| v.parse().ok()),
        page: query.get("page").and_then(|v| v.parse().ok()).unwrap_or(1),
        distinct: split_csv(query.get("distinct")),
        distinct_counts: split_csv(query.get("distinct-counts")),
    }
}

pub(crate) fn field_selection(query: &HashMap<String, String>) -> FieldSelection {
    FieldSelection::from_params(
        query.get("includeFields").map(String::as_str),
        query.get("excludeFields").map(String::as_str),
    )
}

pub(crate) fn boolean_param(query: &HashMap<String, String>, name: &str) -> bool {
    matches!(
        query.get(name).map(String::as_str),
        Some("1") | Some("true")
    )
}

fn split_csv(raw: Option<&String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launder_id_rejects_path_tricks() {
        assert!(launder_id("abc-123_X").is_ok());
        assert!(launder_id("").is_err());
        assert!(launder_id("../etc/passwd").is_err());
        assert!(launder_id("a b").is_err());
    }

    #[test]
    fn list_params_parse_pagination_and_distinct() {
        let query: HashMap<String, String> = [
            ("published", "any"),
            ("perPage", "5"),
            ("page", "2"),
            ("distinct", "color, size"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let params = list_params(&query);
        assert!(params.published_any);
        assert_eq!(params.per_page, Some(5));
        assert_eq!(params.page, 2);
        assert_eq!(params.distinct, vec!["color", "size"]);
    }
}
