//! Schema field descriptors
//!
//! A content type's schema is defined once at start-up and never mutated
//! by a request. Handlers work with derived, filtered copies.

use serde::{Deserialize, Serialize};

/// Who gets to see a field in rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldVisibility {
    /// Serialized for every identity.
    Public,
    /// Never serialized to a client; still usable server-side.
    Hidden,
    /// Serialized only for identities with edit permission on the type.
    RequiresEdit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    Float,
    /// Array of plain strings.
    Tags,
    /// Free-form nested object.
    Object,
    /// Array of sub-objects, each optionally carrying an `id`/`_id`.
    ObjectArray,
    /// Uploaded file descriptor.
    Attachment,
    Select {
        choices: Vec<String>,
    },
    /// Reference to other documents. The virtual field holds resolved
    /// documents; `ids_field` is the shadow field storing raw ids.
    Join {
        ids_field: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub visibility: FieldVisibility,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility: FieldVisibility::Public,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visibility = FieldVisibility::Hidden;
        self
    }

    pub fn requires_edit(mut self) -> Self {
        self.visibility = FieldVisibility::RequiresEdit;
        self
    }

    pub fn is_join(&self) -> bool {
        matches!(self.kind, FieldKind::Join { .. })
    }

    /// The shadow identifier field backing a join, if any.
    pub fn shadow_field(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Join { ids_field } => Some(ids_field),
            _ => None,
        }
    }
}
