//! Content types and their registry
//!
//! The registry is built once at start-up and handed to the services that
//! need it. Nothing looks collaborators up by name at call time.

use crate::schema::FieldDescriptor;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_PER_PAGE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    /// Typed, non-hierarchical record.
    Piece,
    /// Hierarchical record participating in the page tree.
    Page,
}

#[derive(Debug, Clone)]
pub struct ContentType {
    pub name: String,
    pub kind: ContentKind,
    pub schema: Vec<FieldDescriptor>,
    /// Module-scoped API keys valid only for this type.
    pub api_keys: Vec<String>,
    /// Clamp applied when `perPage` is absent or too large.
    pub max_per_page: usize,
    /// Allow-list of fields usable with the `distinct` query parameter.
    pub safe_distinct: Vec<String>,
    /// When set, even GET requires edit permission on this type.
    pub get_requires_edit: bool,
}

impl ContentType {
    pub fn piece(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ContentKind::Piece,
            schema: Vec::new(),
            api_keys: Vec::new(),
            max_per_page: DEFAULT_MAX_PER_PAGE,
            safe_distinct: Vec::new(),
            get_requires_edit: false,
        }
    }

    pub fn page(name: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Page,
            ..Self::piece(name)
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.schema.push(field);
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_keys.push(key.into());
        self
    }

    pub fn with_safe_distinct(mut self, field: impl Into<String>) -> Self {
        self.safe_distinct.push(field.into());
        self
    }

    pub fn with_max_per_page(mut self, max: usize) -> Self {
        self.max_per_page = max;
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.schema.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    types: Vec<ContentType>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, ty: ContentType) -> Self {
        self.types.push(ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ContentType> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn types(&self) -> &[ContentType] {
        &self.types
    }

    /// The registered page type, if any. At most one is expected.
    pub fn page_type(&self) -> Option<&ContentType> {
        self.types.iter().find(|t| t.kind == ContentKind::Page)
    }

    /// Resolve a module-scoped API key to its owning type.
    pub fn type_for_key(&self, key: &str) -> Option<&ContentType> {
        self.types
            .iter()
            .find(|t| t.api_keys.iter().any(|k| k == key))
    }
}
