//! Content service
//!
//! One method per HTTP verb, each a linear async flow over the engine
//! components: scoped read, operator compilation, schema subsetting,
//! conversion, persistence, re-read. PATCH runs under the per-document
//! advisory lock; PUT is last-write-wins and does not.

use crate::pages::{self, MovePosition, SimplePageTree};
use crate::query::{DocumentQuery, ListParams, ListResult};
use crate::visibility::{self, FieldSelection};
use crate::{convert, patch, subset};
use chrono::Utc;
use corpus_core::{
    document, ContentKind, ContentRegistry, ContentType, CorpusResult, Document, Error, Identity,
};
use corpus_store::{DocumentStore, LockService};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const LOCK_PREFIX: &str = "corpus-doc-";

pub struct ContentService {
    store: Arc<dyn DocumentStore>,
    registry: Arc<ContentRegistry>,
    locks: Arc<LockService>,
}

impl ContentService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<ContentRegistry>,
        locks: Arc<LockService>,
    ) -> Self {
        Self {
            store,
            registry,
            locks,
        }
    }

    pub fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    fn ty(&self, name: &str) -> CorpusResult<&ContentType> {
        self.registry.get(name).ok_or(Error::NotFound)
    }

    fn require_edit(identity: &Identity, ty: &ContentType) -> CorpusResult<()> {
        if identity.can_edit(ty) {
            Ok(())
        } else {
            Err(Error::forbidden())
        }
    }

    fn page_tree(&self, ty: &ContentType) -> SimplePageTree {
        SimplePageTree::new(self.store.clone(), ty.name.clone())
    }

    /// Fetch an existing, non-trashed document of the given type for
    /// mutation, bypassing publication scoping.
    async fn for_editing(&self, ty: &ContentType, id: &str) -> CorpusResult<Document> {
        self.store
            .get(id)
            .await?
            .filter(|doc| {
                document::type_name(doc) == Some(ty.name.as_str()) && !document::is_trash(doc)
            })
            .ok_or(Error::NotFound)
    }

    /// Re-read a just-written document through the identity-scoped query
    /// and the visibility filter, as responses always are.
    async fn reread(
        &self,
        identity: &Identity,
        ty: &ContentType,
        id: &str,
        selection: &FieldSelection,
    ) -> CorpusResult<Document> {
        let query = DocumentQuery::scoped(self.store.as_ref(), ty, identity)?;
        let doc = query.one(id).await?.ok_or(Error::NotFound)?;
        Ok(visibility::filter(&doc, ty, identity, selection))
    }

    pub async fn list(
        &self,
        identity: &Identity,
        type_name: &str,
        params: &ListParams,
        selection: &FieldSelection,
    ) -> CorpusResult<ListResult> {
        let ty = self.ty(type_name)?;
        let query = DocumentQuery::scoped(self.store.as_ref(), ty, identity)?;
        let mut result = query.list(params).await?;
        result.results = result
            .results
            .iter()
            .map(|doc| visibility::filter(doc, ty, identity, selection))
            .collect();
        Ok(result)
    }

    pub async fn get(
        &self,
        identity: &Identity,
        type_name: &str,
        id: &str,
        selection: &FieldSelection,
    ) -> CorpusResult<Document> {
        let ty = self.ty(type_name)?;
        self.reread(identity, ty, id, selection).await
    }

    pub async fn insert(
        &self,
        identity: &Identity,
        type_name: &str,
        body: &Map<String, Value>,
    ) -> CorpusResult<Document> {
        let ty = self.ty(type_name)?;
        Self::require_edit(identity, ty)?;

        let id = Uuid::new_v4().simple().to_string();
        let mut doc = Document::new();
        doc.insert(document::ID.to_string(), Value::String(id.clone()));
        doc.insert(document::TYPE.to_string(), Value::String(ty.name.clone()));
        doc.insert(
            "createdAt".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let names = subset::touched_names(body);
        let schema_subset = subset::subset_by_names(&ty.schema, &names);
        convert::convert(&schema_subset, body, &mut doc, false)?;
        apply_published(&mut doc, body)?;

        match ty.kind {
            ContentKind::Page => {
                let parent_id = body.get("_parentId").and_then(Value::as_str);
                self.page_tree(ty).insert_child(parent_id, doc).await?;
            }
            ContentKind::Piece => {
                apply_slug(&mut doc, body, &id)?;
                self.store.insert(doc).await?;
            }
        }
        info!(%id, ty = %ty.name, "inserted document");
        self.reread(identity, ty, &id, &FieldSelection::none())
            .await
    }

    /// Full replacement. Every schema field is touched; absence resets to
    /// the empty value. Identifier and type never change, and a page's
    /// position in the tree is not movable this way.
    pub async fn replace(
        &self,
        identity: &Identity,
        type_name: &str,
        id: &str,
        body: &Map<String, Value>,
    ) -> CorpusResult<Document> {
        let ty = self.ty(type_name)?;
        Self::require_edit(identity, ty)?;
        let existing = self.for_editing(ty, id).await?;

        let mut next = structural_copy(&existing, ty);
        convert::convert(&ty.schema, body, &mut next, true)?;
        apply_published(&mut next, body)?;
        if ty.kind == ContentKind::Piece {
            apply_slug(&mut next, body, id)?;
        }
        next.insert(
            "updatedAt".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        self.store.update(id, next).await?;
        info!(id, ty = %ty.name, "replaced document");
        self.reread(identity, ty, id, &FieldSelection::none()).await
    }

    /// Partial update under the per-document advisory lock: the document
    /// is read fresh, operators are compiled against that state, and only
    /// the schema subset the body touches is converted and written.
    pub async fn patch(
        &self,
        identity: &Identity,
        type_name: &str,
        id: &str,
        body: &Map<String, Value>,
    ) -> CorpusResult<Document> {
        let ty = self.ty(type_name)?;
        Self::require_edit(identity, ty)?;

        let key = format!("{LOCK_PREFIX}{id}");
        self.locks
            .with_lock(&key, async {
                let existing = self.for_editing(ty, id).await?;
                let flat = patch::compile(&existing, body)?;
                let schema_subset = subset::subset_for_patch(&ty.schema, body);

                let mut next = existing;
                convert::convert(&schema_subset, &flat, &mut next, false)?;
                if flat.contains_key(document::PUBLISHED) {
                    apply_published(&mut next, &flat)?;
                }
                if ty.kind == ContentKind::Piece && flat.contains_key(document::SLUG) {
                    apply_slug(&mut next, &flat, id)?;
                }
                next.insert(
                    "updatedAt".to_string(),
                    Value::String(Utc::now().to_rfc3339()),
                );

                self.store.update(id, next).await?;
                debug!(id, ty = %ty.name, "patched document");
                Ok(())
            })
            .await?;

        self.reread(identity, ty, id, &FieldSelection::none()).await
    }

    /// Soft delete: the document moves to the trash and disappears from
    /// every query tier.
    pub async fn trash(
        &self,
        identity: &Identity,
        type_name: &str,
        id: &str,
    ) -> CorpusResult<()> {
        let ty = self.ty(type_name)?;
        Self::require_edit(identity, ty)?;
        let mut existing = self.for_editing(ty, id).await?;
        existing.insert(document::TRASH.to_string(), Value::Bool(true));
        self.store.update(id, existing).await?;
        info!(id, ty = %ty.name, "trashed document");
        Ok(())
    }

    /// The home page with its immediate children, or the whole tree with
    /// `all` (page-admin only), optionally flattened.
    pub async fn page_home(
        &self,
        identity: &Identity,
        all: bool,
        flat: bool,
    ) -> CorpusResult<Value> {
        let ty = self.registry.page_type().ok_or(Error::NotFound)?;
        let tree = self.page_tree(ty);
        if all {
            if !identity.can_admin_pages(ty) {
                return Err(Error::forbidden());
            }
            let home = tree.tree(1000, false).await?;
            let home = self.filter_tree(&home, ty, identity);
            if flat {
                let nodes: Vec<Value> =
                    pages::flatten(&home).into_iter().map(Value::Object).collect();
                return Ok(Value::Array(nodes));
            }
            return Ok(Value::Object(home));
        }

        let published_only = !identity.can_edit(ty);
        let home = tree.tree(1, published_only).await?;
        Ok(Value::Object(self.filter_tree(&home, ty, identity)))
    }

    /// One page by id with its immediate children.
    pub async fn page_get(
        &self,
        identity: &Identity,
        id: &str,
        selection: &FieldSelection,
    ) -> CorpusResult<Document> {
        let ty = self.registry.page_type().ok_or(Error::NotFound)?;
        let published_only = !identity.can_edit(ty);
        let page = self
            .page_tree(ty)
            .with_children(id, published_only)
            .await?;
        let mut filtered = self.filter_tree(&page, ty, identity);
        if selection.include.is_some() || selection.exclude.is_some() {
            filtered = visibility::filter(&filtered, ty, identity, selection);
        }
        Ok(filtered)
    }

    /// Move a page relative to another. Page-admin only.
    pub async fn page_move(
        &self,
        identity: &Identity,
        id: &str,
        target_id: &str,
        position: MovePosition,
    ) -> CorpusResult<()> {
        let ty = self.registry.page_type().ok_or(Error::NotFound)?;
        if !identity.can_admin_pages(ty) {
            return Err(Error::forbidden());
        }
        self.page_tree(ty).move_page(id, target_id, position).await
    }

    /// Visibility-filter a tree node and its `_children` recursively.
    fn filter_tree(&self, node: &Document, ty: &ContentType, identity: &Identity) -> Document {
        let mut out = visibility::filter(node, ty, identity, &FieldSelection::none());
        if let Some(Value::Array(children)) = node.get(pages::CHILDREN) {
            let filtered: Vec<Value> = children
                .iter()
                .filter_map(Value::as_object)
                .map(|child| Value::Object(self.filter_tree(child, ty, identity)))
                .collect();
            out.insert(pages::CHILDREN.to_string(), Value::Array(filtered));
        }
        out
    }
}

/// Fields that survive a full replacement untouched: identity, lineage and
/// tree position.
fn structural_copy(existing: &Document, ty: &ContentType) -> Document {
    let mut keep: Vec<&str> = vec![document::ID, document::TYPE, "createdAt", document::TRASH];
    if ty.kind == ContentKind::Page {
        keep.extend([document::SLUG, pages::PATH, pages::LEVEL, pages::RANK]);
    }
    let mut out = Document::new();
    for key in keep {
        if let Some(value) = existing.get(key) {
            out.insert(key.to_string(), value.clone());
        }
    }
    out
}

fn apply_published(doc: &mut Document, body: &Map<String, Value>) -> CorpusResult<()> {
    let published = match body.get(document::PUBLISHED) {
        Some(value) => convert::launder_boolean(value)?,
        None => false,
    };
    doc.insert(document::PUBLISHED.to_string(), Value::Bool(published));
    Ok(())
}

/// A piece's slug comes from the body, falls back to the title, and as a
/// last resort to the id.
fn apply_slug(doc: &mut Document, body: &Map<String, Value>, id: &str) -> CorpusResult<()> {
    let slug = match body.get(document::SLUG) {
        Some(value) => {
            let raw = value.as_str().ok_or_else(Error::invalid)?;
            let slug = convert::slugify(raw);
            if slug.is_empty() {
                return Err(Error::invalid());
            }
            slug
        }
        None => {
            let title = doc.get("title").and_then(Value::as_str).unwrap_or_default();
            let slug = convert::slugify(title);
            if slug.is_empty() {
                id.to_string()
            } else {
                slug
            }
        }
    };
    doc.insert(document::SLUG.to_string(), Value::String(slug));
    Ok(())
}
