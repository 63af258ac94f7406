//! Document representation
//!
//! Documents are schemaless JSON objects owned by the document store. The
//! reserved keys below are the only ones the engine interprets directly;
//! everything else is driven by the content type's schema.

use serde_json::{Map, Value};

/// A page or piece as stored: field name -> value.
pub type Document = Map<String, Value>;

/// Reserved field: document identifier, immutable via PUT/PATCH.
pub const ID: &str = "_id";
/// Reserved field: content type tag, immutable via PUT/PATCH.
pub const TYPE: &str = "type";
pub const SLUG: &str = "slug";
pub const TAGS: &str = "tags";
pub const PUBLISHED: &str = "published";
pub const TRASH: &str = "trash";
/// Internal descriptor of who else may edit; privileged information.
pub const DOC_PERMISSIONS: &str = "docPermissions";

/// Fields always retained when `includeFields` narrows a response, so
/// rendering and join resolution keep working.
pub const ALWAYS_INCLUDED: &[&str] = &[ID, TYPE, SLUG, TAGS];

pub fn id(doc: &Document) -> Option<&str> {
    doc.get(ID).and_then(Value::as_str)
}

pub fn type_name(doc: &Document) -> Option<&str> {
    doc.get(TYPE).and_then(Value::as_str)
}

pub fn is_published(doc: &Document) -> bool {
    doc.get(PUBLISHED).and_then(Value::as_bool).unwrap_or(false)
}

pub fn is_trash(doc: &Document) -> bool {
    doc.get(TRASH).and_then(Value::as_bool).unwrap_or(false)
}
