//! Schema subsetter
//!
//! Computes the minimal schema subset touched by a request body, so
//! conversion never overwrites unrelated fields. The subset doubles as the
//! write allow-list: a field outside it cannot be altered by the request,
//! whatever the body names.

use crate::patch;
use corpus_core::FieldDescriptor;
use serde_json::{Map, Value};

/// Field names touched by a patch body: every plain top-level key plus the
/// first segment of every operator path (nested schema fields convert as a
/// unit).
pub fn touched_names(body: &Map<String, Value>) -> Vec<String> {
    let mut names: Vec<String> = body
        .keys()
        .filter(|key| !patch::is_operator(key))
        .cloned()
        .collect();
    for path in patch::operator_paths(body) {
        let head = path.split('.').next().unwrap_or(&path).to_string();
        if !names.contains(&head) {
            names.push(head);
        }
    }
    names
}

/// Subset the schema to the named fields, preserving the schema's own
/// ordering and complete field definitions. Naming a join's virtual field
/// or its shadow identifier field selects the declaring join itself, since
/// conversion operates on the join field.
pub fn subset_by_names(schema: &[FieldDescriptor], names: &[String]) -> Vec<FieldDescriptor> {
    schema
        .iter()
        .filter(|field| {
            names.iter().any(|name| {
                name == &field.name || field.shadow_field().is_some_and(|shadow| shadow == name)
            })
        })
        .cloned()
        .collect()
}

/// Subset for a PATCH body.
pub fn subset_for_patch(schema: &[FieldDescriptor], body: &Map<String, Value>) -> Vec<FieldDescriptor> {
    subset_by_names(schema, &touched_names(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::{FieldKind, FieldVisibility};
    use serde_json::json;

    fn schema() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("title", FieldKind::String),
            FieldDescriptor::new("color", FieldKind::Select {
                choices: vec!["red".to_string(), "blue".to_string()],
            }),
            FieldDescriptor::new("addresses", FieldKind::ObjectArray),
            FieldDescriptor::new(
                "_people",
                FieldKind::Join {
                    ids_field: "peopleIds".to_string(),
                },
            ),
        ]
    }

    fn body(value: serde_json::Value) -> Map<String, serde_json::Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn collects_plain_keys_and_operator_path_heads() {
        let body = body(json!({
            "title": "x",
            "$push": { "addresses.old": { "street": "X" } }
        }));
        let names = touched_names(&body);
        assert_eq!(names, vec!["title".to_string(), "addresses".to_string()]);
    }

    #[test]
    fn subset_preserves_schema_order_and_definitions() {
        let schema = schema();
        let subset = subset_by_names(
            &schema,
            &["addresses".to_string(), "title".to_string()],
        );
        assert_eq!(subset.len(), 2);
        assert_eq!(subset[0].name, "title");
        assert_eq!(subset[1].name, "addresses");
        assert_eq!(subset[0].visibility, FieldVisibility::Public);
    }

    #[test]
    fn shadow_field_selects_the_declaring_join() {
        let schema = schema();
        let subset = subset_by_names(&schema, &["peopleIds".to_string()]);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].name, "_people");
    }

    #[test]
    fn virtual_join_name_selects_the_join() {
        let schema = schema();
        let subset = subset_for_patch(
            &schema,
            &body(json!({ "$push": { "peopleIds": "u9" } })),
        );
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].name, "_people");

        let subset = subset_for_patch(&schema, &body(json!({ "_people": ["u9"] })));
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].name, "_people");
    }

    #[test]
    fn unnamed_fields_stay_out_of_the_subset() {
        let schema = schema();
        let subset = subset_for_patch(&schema, &body(json!({ "title": "x" })));
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].name, "title");
    }
}
