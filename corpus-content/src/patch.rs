//! Patch operator compiler
//!
//! Rewrites a declarative patch body containing `$push`, `$pullAll` or
//! `$pullAllById` into plain field assignments, resolving array context
//! against the current state of the target document. The document must be
//! read immediately before compiling, never a cached copy, which is why
//! the caller holds the per-document lock around read + compile + persist.
//!
//! Compilation always emits a full replacement value for the touched
//! array path, so schema conversion and validation run uniformly over
//! plain values.

use corpus_core::{CorpusResult, Document, Error};
use serde_json::{Map, Value};

pub const PUSH: &str = "$push";
pub const PULL_ALL: &str = "$pullAll";
pub const PULL_ALL_BY_ID: &str = "$pullAllById";
const EACH: &str = "$each";

const OPERATORS: &[&str] = &[PUSH, PULL_ALL, PULL_ALL_BY_ID];

pub fn is_operator(key: &str) -> bool {
    key.starts_with('$')
}

/// Dot-notation paths referenced by any operator in the body.
pub fn operator_paths(body: &Map<String, Value>) -> Vec<String> {
    OPERATORS
        .iter()
        .filter_map(|op| body.get(*op))
        .filter_map(Value::as_object)
        .flat_map(|ops| ops.keys().cloned())
        .collect()
}

/// Compile `body` against the current document state into a flat patch of
/// plain assignments. A body mixing more than one operator family is
/// rejected rather than resolved by accidental precedence.
pub fn compile(existing: &Document, body: &Map<String, Value>) -> CorpusResult<Map<String, Value>> {
    let present: Vec<&str> = OPERATORS
        .iter()
        .copied()
        .filter(|op| body.contains_key(*op))
        .collect();
    if present.len() > 1 {
        return Err(Error::invalid());
    }

    let mut flat = Map::new();
    for (key, value) in body {
        if !is_operator(key) {
            flat.insert(key.clone(), value.clone());
        }
    }

    match present.first().copied() {
        Some(PUSH) => {
            for (path, value) in operand(body, PUSH)? {
                let mut array = current_array(existing, path)?;
                match each_values(value) {
                    Some(values) => array.extend(values.iter().cloned()),
                    None => array.push(value.clone()),
                }
                assign(&mut flat, existing, path, Value::Array(array));
            }
        }
        Some(PULL_ALL) => {
            for (path, value) in operand(body, PULL_ALL)? {
                let removals = value.as_array().ok_or_else(Error::invalid)?;
                let array: Vec<Value> = current_array(existing, path)?
                    .into_iter()
                    .filter(|element| !removals.contains(element))
                    .collect();
                assign(&mut flat, existing, path, Value::Array(array));
            }
        }
        Some(PULL_ALL_BY_ID) => {
            for (path, value) in operand(body, PULL_ALL_BY_ID)? {
                let ids = id_list(value)?;
                let array: Vec<Value> = current_array(existing, path)?
                    .into_iter()
                    .filter(|element| !element_id_matches(element, &ids))
                    .collect();
                assign(&mut flat, existing, path, Value::Array(array));
            }
        }
        _ => {}
    }

    Ok(flat)
}

fn operand<'a>(
    body: &'a Map<String, Value>,
    op: &str,
) -> CorpusResult<&'a Map<String, Value>> {
    body.get(op)
        .and_then(Value::as_object)
        .ok_or_else(Error::invalid)
}

/// `{ $each: [...] }` unwrapping for `$push`.
fn each_values(value: &Value) -> Option<&Vec<Value>> {
    value.as_object()?.get(EACH)?.as_array()
}

/// The array currently stored at `path`. Missing paths compile as empty;
/// a present non-array value is a bad request.
fn current_array(existing: &Document, path: &str) -> CorpusResult<Vec<Value>> {
    match get_path(existing, path) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(Error::invalid()),
    }
}

/// A single id or a list of ids, normalized to a list.
fn id_list(value: &Value) -> CorpusResult<Vec<String>> {
    match value {
        Value::String(id) => Ok(vec![id.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(Error::invalid)
            })
            .collect(),
        _ => Err(Error::invalid()),
    }
}

/// Element identifiers are checked against both `_id` and `id`.
fn element_id_matches(element: &Value, ids: &[String]) -> bool {
    let matches = |key: &str| {
        element
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|id| ids.iter().any(|candidate| candidate == id))
    };
    matches("_id") || matches("id")
}

/// Resolve a dot-notation path against the document.
fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at `path` inside the flat patch. For nested paths the
/// top-level object is seeded from the existing document first, so sibling
/// subfields survive the full-value replacement that conversion performs.
fn assign(flat: &mut Map<String, Value>, existing: &Document, path: &str, value: Value) {
    let Some((head, rest)) = path.split_once('.') else {
        flat.insert(path.to_string(), value);
        return;
    };
    let seed = existing
        .get(head)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let mut target = flat.entry(head.to_string()).or_insert(seed);
    let mut segments = rest.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        let Value::Object(object) = target else { return };
        if segments.peek().is_none() {
            object.insert(segment.to_string(), value);
            return;
        }
        target = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn push_appends_one_element() {
        let existing = doc(json!({
            "_id": "p1",
            "addresses": [ { "street": "1 Front St" }, { "street": "2 Back St" } ]
        }));
        let flat = compile(
            &existing,
            &body(json!({ "$push": { "addresses": { "street": "X" } } })),
        )
        .unwrap();

        let addresses = flat.get("addresses").unwrap().as_array().unwrap();
        assert_eq!(addresses.len(), 3);
        assert_eq!(addresses[2], json!({ "street": "X" }));
    }

    #[test]
    fn push_each_appends_in_order() {
        let existing = doc(json!({ "_id": "p1", "tags": ["a"] }));
        let flat = compile(
            &existing,
            &body(json!({ "$push": { "tags": { "$each": ["b", "c"] } } })),
        )
        .unwrap();
        assert_eq!(flat.get("tags").unwrap(), &json!(["a", "b", "c"]));
    }

    #[test]
    fn push_onto_missing_path_starts_empty() {
        let existing = doc(json!({ "_id": "p1" }));
        let flat = compile(&existing, &body(json!({ "$push": { "tags": "a" } }))).unwrap();
        assert_eq!(flat.get("tags").unwrap(), &json!(["a"]));
    }

    #[test]
    fn push_supports_dot_paths_and_keeps_siblings() {
        let existing = doc(json!({
            "_id": "p1",
            "contact": { "label": "office", "phones": ["111"] }
        }));
        let flat = compile(
            &existing,
            &body(json!({ "$push": { "contact.phones": "222" } })),
        )
        .unwrap();

        let contact = flat.get("contact").unwrap();
        assert_eq!(contact.get("phones").unwrap(), &json!(["111", "222"]));
        assert_eq!(contact.get("label").unwrap(), &json!("office"));
    }

    #[test]
    fn pull_all_removes_deep_equal_values() {
        let existing = doc(json!({
            "_id": "p1",
            "addresses": [
                { "street": "1 Front St" },
                { "street": "2 Back St" },
                { "street": "1 Front St" }
            ]
        }));
        let flat = compile(
            &existing,
            &body(json!({ "$pullAll": { "addresses": [ { "street": "1 Front St" } ] } })),
        )
        .unwrap();
        assert_eq!(
            flat.get("addresses").unwrap(),
            &json!([{ "street": "2 Back St" }])
        );
    }

    #[test]
    fn pull_all_by_id_accepts_a_single_id() {
        let existing = doc(json!({
            "_id": "p1",
            "items": [ { "id": "a", "n": 1 }, { "_id": "b", "n": 2 }, { "id": "c", "n": 3 } ]
        }));
        let flat = compile(
            &existing,
            &body(json!({ "$pullAllById": { "items": "b" } })),
        )
        .unwrap();
        let items = flat.get("items").unwrap().as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("id").unwrap(), "a");
        assert_eq!(items[1].get("id").unwrap(), "c");
    }

    #[test]
    fn pull_all_by_id_missing_id_is_a_noop() {
        let existing = doc(json!({
            "_id": "p1",
            "items": [ { "id": "a" }, { "id": "b" } ]
        }));
        let flat = compile(
            &existing,
            &body(json!({ "$pullAllById": { "items": ["zzz"] } })),
        )
        .unwrap();
        assert_eq!(flat.get("items").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn plain_assignments_pass_through() {
        let existing = doc(json!({ "_id": "p1", "title": "old" }));
        let flat = compile(
            &existing,
            &body(json!({ "title": "new", "$push": { "tags": "x" } })),
        )
        .unwrap();
        assert_eq!(flat.get("title").unwrap(), &json!("new"));
        assert_eq!(flat.get("tags").unwrap(), &json!(["x"]));
    }

    #[test]
    fn mixed_operator_families_are_rejected() {
        let existing = doc(json!({ "_id": "p1", "items": [] }));
        let result = compile(
            &existing,
            &body(json!({
                "$push": { "items": { "id": "a" } },
                "$pullAllById": { "items": "b" }
            })),
        );
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[test]
    fn pushing_onto_a_scalar_is_rejected() {
        let existing = doc(json!({ "_id": "p1", "title": "hello" }));
        let result = compile(&existing, &body(json!({ "$push": { "title": "x" } })));
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }
}
