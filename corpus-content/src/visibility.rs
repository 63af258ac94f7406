//! Field visibility filter
//!
//! Pure function from (document, identity, selection) to the rendition a
//! client is allowed to see. The canonical document is never mutated.

use corpus_core::{document, ContentType, Document, FieldVisibility, Identity};

/// Caller-supplied narrowing from the `includeFields` / `excludeFields`
/// query parameters. When both are supplied, include wins entirely.
#[derive(Debug, Clone, Default)]
pub struct FieldSelection {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

impl FieldSelection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_params(include: Option<&str>, exclude: Option<&str>) -> Self {
        let split = |raw: &str| -> Vec<String> {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };
        Self {
            include: include.map(split),
            exclude: exclude.map(split),
        }
    }
}

/// Strip fields the identity may not see, then apply the caller's
/// narrowing. Schema-driven exclusions always win: a hidden field stays
/// hidden even when explicitly included.
pub fn filter(
    doc: &Document,
    ty: &ContentType,
    identity: &Identity,
    selection: &FieldSelection,
) -> Document {
    let can_edit = identity.can_edit(ty);
    let mut out = doc.clone();

    for field in &ty.schema {
        let strip = match field.visibility {
            FieldVisibility::Public => false,
            FieldVisibility::Hidden => true,
            FieldVisibility::RequiresEdit => !can_edit,
        };
        if strip {
            out.remove(&field.name);
            if let Some(shadow) = field.shadow_field() {
                out.remove(shadow);
            }
        }
    }

    // Who else can edit is itself privileged information.
    if !can_edit {
        out.remove(document::DOC_PERMISSIONS);
    }

    if let Some(include) = &selection.include {
        let mut keep: Vec<&str> = document::ALWAYS_INCLUDED.to_vec();
        for name in include {
            keep.push(name.as_str());
            // An included join keeps its shadow field so reference wiring
            // survives the narrowing.
            if let Some(shadow) = ty.field(name).and_then(|f| f.shadow_field()) {
                keep.push(shadow);
            }
        }
        out.retain(|key, _| keep.contains(&key.as_str()));
    } else if let Some(exclude) = &selection.exclude {
        for name in exclude {
            out.remove(name);
            if let Some(shadow) = ty.field(name).and_then(|f| f.shadow_field()) {
                out.remove(shadow);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::{FieldDescriptor, FieldKind, KeyScope};
    use serde_json::json;

    fn ty() -> ContentType {
        ContentType::piece("products")
            .with_field(FieldDescriptor::new("title", FieldKind::String))
            .with_field(FieldDescriptor::new("internalNotes", FieldKind::String).hidden())
            .with_field(FieldDescriptor::new("costPrice", FieldKind::Float).requires_edit())
            .with_field(FieldDescriptor::new(
                "_people",
                FieldKind::Join {
                    ids_field: "peopleIds".to_string(),
                },
            ))
    }

    fn doc() -> Document {
        json!({
            "_id": "p1",
            "type": "products",
            "slug": "p-one",
            "title": "One",
            "internalNotes": "do not ship",
            "costPrice": 1.5,
            "peopleIds": ["u1"],
            "docPermissions": ["edit-products"]
        })
        .as_object()
        .unwrap()
        .clone()
    }

    fn editor() -> Identity {
        Identity::System {
            scope: KeyScope::Module("products".to_string()),
        }
    }

    #[test]
    fn hidden_fields_never_render_for_anyone() {
        let ty = ty();
        for identity in [Identity::Anonymous, editor()] {
            let out = filter(&doc(), &ty, &identity, &FieldSelection::none());
            assert!(!out.contains_key("internalNotes"));
        }
    }

    #[test]
    fn hidden_fields_survive_explicit_include() {
        let ty = ty();
        let selection = FieldSelection::from_params(Some("internalNotes,title"), None);
        let out = filter(&doc(), &ty, &Identity::Anonymous, &selection);
        assert!(!out.contains_key("internalNotes"));
        assert!(out.contains_key("title"));
    }

    #[test]
    fn requires_edit_depends_on_identity() {
        let ty = ty();
        let public = filter(&doc(), &ty, &Identity::Anonymous, &FieldSelection::none());
        assert!(!public.contains_key("costPrice"));
        assert!(!public.contains_key("docPermissions"));

        let manage = filter(&doc(), &ty, &editor(), &FieldSelection::none());
        assert!(manage.contains_key("costPrice"));
        assert!(manage.contains_key("docPermissions"));
    }

    #[test]
    fn include_wins_over_exclude() {
        let ty = ty();
        let selection = FieldSelection::from_params(Some("title"), Some("title"));
        let out = filter(&doc(), &ty, &Identity::Anonymous, &selection);
        assert!(out.contains_key("title"));
        // Identifier, type and slug always ride along.
        assert!(out.contains_key("_id"));
        assert!(out.contains_key("type"));
        assert!(out.contains_key("slug"));
    }

    #[test]
    fn excluding_a_join_drops_its_shadow_field() {
        let ty = ty();
        let selection = FieldSelection::from_params(None, Some("_people"));
        let out = filter(&doc(), &ty, &editor(), &selection);
        assert!(!out.contains_key("peopleIds"));
    }

    #[test]
    fn including_a_join_keeps_its_shadow_field() {
        let ty = ty();
        let selection = FieldSelection::from_params(Some("_people"), None);
        let out = filter(&doc(), &ty, &editor(), &selection);
        assert!(out.contains_key("peopleIds"));
        assert!(!out.contains_key("title"));
    }
}
