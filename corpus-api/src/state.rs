//! Application state
//!
//! Every collaborator is constructed once here and shared behind `Arc`s.
//! Nothing is looked up by name at request time.

use corpus_content::ContentService;
use corpus_core::{ApiConfig, ContentRegistry, CorpusResult, Permission};
use corpus_store::{
    AttachmentStore, BearerTokenStore, DocumentStore, LockService, MemoryDocumentStore,
    SessionStore, UserDirectory,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub registry: Arc<ContentRegistry>,
    pub content: Arc<ContentService>,
    pub store: Arc<dyn DocumentStore>,
    pub tokens: Arc<BearerTokenStore>,
    pub users: Arc<UserDirectory>,
    pub sessions: Arc<SessionStore>,
    pub attachments: Arc<AttachmentStore>,
}

impl AppState {
    /// Build the full collaborator graph over an in-memory document
    /// store, seeding the page tree's home page when a page type is
    /// registered.
    pub async fn new(config: ApiConfig, registry: ContentRegistry) -> CorpusResult<Self> {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        Self::with_store(config, registry, store).await
    }

    pub async fn with_store(
        config: ApiConfig,
        registry: ContentRegistry,
        store: Arc<dyn DocumentStore>,
    ) -> CorpusResult<Self> {
        let registry = Arc::new(registry);
        let locks = Arc::new(LockService::new());
        let content = Arc::new(ContentService::new(
            store.clone(),
            registry.clone(),
            locks,
        ));
        let tokens = Arc::new(BearerTokenStore::new(config.bearer_lifetime_days));

        let state = Self {
            config,
            registry,
            content,
            store,
            tokens,
            users: Arc::new(UserDirectory::new()),
            sessions: Arc::new(SessionStore::new()),
            attachments: Arc::new(AttachmentStore::new()),
        };
        state.seed_home_page().await?;
        info!("application state initialized");
        Ok(state)
    }

    /// The page tree needs a root to exist before the first request.
    async fn seed_home_page(&self) -> CorpusResult<()> {
        let Some(pages) = self.registry.page_type() else {
            return Ok(());
        };
        let existing = self
            .store
            .find(&corpus_store::DocumentFilter::for_type(&pages.name))
            .await?;
        if existing.iter().any(|p| {
            p.get("level").and_then(Value::as_i64) == Some(0)
        }) {
            return Ok(());
        }
        let home = json!({
            "_id": "home",
            "type": pages.name,
            "title": "Home",
            "slug": "/",
            "path": "/",
            "level": 0,
            "rank": 0,
            "published": true,
        });
        let home = home.as_object().cloned().unwrap_or_default();
        self.store.insert(home).await?;
        Ok(())
    }

    /// Convenience for start-up scripts and tests: create a user in the
    /// directory.
    pub async fn add_user(
        &self,
        username: &str,
        password: &str,
        permissions: Vec<Permission>,
    ) -> CorpusResult<String> {
        self.users.insert(username, password, permissions).await
    }
}
