//! Document store boundary
//!
//! The engine never issues partial store-level updates: all mutation goes
//! through `update(id, full_new_state)`. Partial semantics are resolved
//! in-process before the store sees the write.

use async_trait::async_trait;
use corpus_core::{document, CorpusResult, Document, Error};
use tokio::sync::RwLock;

/// Filter for `find`. All present conditions must hold.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub doc_type: Option<String>,
    pub id: Option<String>,
    /// `Some(true)` = published only; `None` = any publication state.
    pub published: Option<bool>,
    /// Trashed documents are excluded unless set.
    pub include_trash: bool,
}

impl DocumentFilter {
    pub fn for_type(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: Some(doc_type.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn published_only(mut self) -> Self {
        self.published = Some(true);
        self
    }

    fn matches(&self, doc: &Document) -> bool {
        if let Some(ty) = &self.doc_type {
            if document::type_name(doc) != Some(ty.as_str()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if document::id(doc) != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(published) = self.published {
            if document::is_published(doc) != published {
                return false;
            }
        }
        if !self.include_trash && document::is_trash(doc) {
            return false;
        }
        true
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, doc: Document) -> CorpusResult<()>;

    /// Fetch by id regardless of publication or trash state.
    async fn get(&self, id: &str) -> CorpusResult<Option<Document>>;

    /// Replace the full document state. Atomic per document.
    async fn update(&self, id: &str, doc: Document) -> CorpusResult<()>;

    /// All matching documents in insertion order.
    async fn find(&self, filter: &DocumentFilter) -> CorpusResult<Vec<Document>>;
}

/// In-memory document store preserving insertion order, used by tests and
/// the demo binary.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<Vec<Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, doc: Document) -> CorpusResult<()> {
        let id = document::id(&doc)
            .ok_or_else(|| Error::internal("document inserted without an _id"))?
            .to_string();
        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| document::id(d) == Some(id.as_str())) {
            return Err(Error::internal(format!("duplicate document id {id}")));
        }
        docs.push(doc);
        Ok(())
    }

    async fn get(&self, id: &str) -> CorpusResult<Option<Document>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|d| document::id(d) == Some(id)).cloned())
    }

    async fn update(&self, id: &str, doc: Document) -> CorpusResult<()> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| document::id(d) == Some(id)) {
            Some(slot) => {
                *slot = doc;
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }

    async fn find(&self, filter: &DocumentFilter) -> CorpusResult<Vec<Document>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().filter(|d| filter.matches(d)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, ty: &str, published: bool) -> Document {
        json!({ "_id": id, "type": ty, "published": published })
            .as_object()
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn find_respects_type_publication_and_trash() {
        let store = MemoryDocumentStore::new();
        store.insert(doc("a", "product", true)).await.unwrap();
        store.insert(doc("b", "product", false)).await.unwrap();
        store.insert(doc("c", "article", true)).await.unwrap();

        let mut trashed = doc("d", "product", true);
        trashed.insert("trash".into(), json!(true));
        store.insert(trashed).await.unwrap();

        let published = store
            .find(&DocumentFilter::for_type("product").published_only())
            .await
            .unwrap();
        assert_eq!(published.len(), 1);

        let any = store.find(&DocumentFilter::for_type("product")).await.unwrap();
        assert_eq!(any.len(), 2);
    }

    #[tokio::test]
    async fn update_replaces_full_state() {
        let store = MemoryDocumentStore::new();
        store.insert(doc("a", "product", true)).await.unwrap();

        let mut next = doc("a", "product", false);
        next.insert("title".into(), json!("renamed"));
        store.update("a", next).await.unwrap();

        let fetched = store.get("a").await.unwrap().unwrap();
        assert_eq!(fetched.get("title"), Some(&json!("renamed")));
        assert!(store.update("missing", doc("missing", "product", true)).await.is_err());
    }
}
