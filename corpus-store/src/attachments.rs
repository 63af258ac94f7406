//! Attachment storage boundary
//!
//! File persistence is an external concern; this keeps descriptors and
//! bytes in memory and hands back the descriptor shape clients embed in
//! documents.

use corpus_core::{CorpusResult, Document, Error};
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

struct StoredAttachment {
    descriptor: Document,
    #[allow(dead_code)]
    bytes: Vec<u8>,
}

#[derive(Default)]
pub struct AttachmentStore {
    files: RwLock<HashMap<String, StoredAttachment>>,
}

impl AttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an uploaded file and return its descriptor, including the
    /// rendition URLs clients read from `_urls`.
    pub async fn save(&self, filename: &str, bytes: Vec<u8>) -> CorpusResult<Document> {
        let name = filename.trim();
        if name.is_empty() || bytes.is_empty() {
            return Err(Error::invalid());
        }
        let id = Uuid::new_v4().simple().to_string();
        let (stem, extension) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, ext),
            _ => (name, "bin"),
        };
        let base = format!("/uploads/attachments/{id}-{stem}");
        let descriptor = json!({
            "_id": id,
            "type": "attachment",
            "name": stem,
            "extension": extension,
            "length": bytes.len(),
            "_urls": {
                "original": format!("{base}.{extension}"),
                "full": format!("{base}.full.{extension}"),
            },
        });
        let descriptor = descriptor.as_object().cloned().unwrap_or_default();
        self.files.write().await.insert(
            id.clone(),
            StoredAttachment {
                descriptor: descriptor.clone(),
                bytes,
            },
        );
        info!(%id, name, "stored attachment");
        Ok(descriptor)
    }

    pub async fn get(&self, id: &str) -> Option<Document> {
        self.files
            .read()
            .await
            .get(id)
            .map(|stored| stored.descriptor.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn descriptor_carries_rendition_urls() {
        let store = AttachmentStore::new();
        let descriptor = store.save("photo.jpg", vec![1, 2, 3]).await.unwrap();
        assert_eq!(descriptor.get("extension").unwrap(), "jpg");
        let urls = descriptor.get("_urls").unwrap().as_object().unwrap();
        assert!(urls.contains_key("original"));
        assert!(urls.contains_key("full"));
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let store = AttachmentStore::new();
        assert!(store.save("", vec![1]).await.is_err());
        assert!(store.save("photo.jpg", Vec::new()).await.is_err());
    }
}
