//! Named advisory locks
//!
//! Serializes PATCH operations per document id: only one read-compile-
//! convert-persist cycle may be mid-flight for a given id; others queue.
//! The guard is released on every exit path, including errors and
//! cancellation, because it is held by RAII across the wrapped future.
//!
//! This implementation is per-process. Multi-instance deployments need a
//! cross-process variant (lease records in the shared document store)
//! behind the same `with_lock` contract.

use corpus_core::CorpusResult;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
pub struct LockService {
    // Entries are retained for the process lifetime; the key space is the
    // set of document ids patched by this instance.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockService {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `body` while holding the named lock. Whatever `body` produces
    /// (success or error) is surfaced unchanged after release.
    pub async fn with_lock<T, F>(&self, key: &str, body: F) -> CorpusResult<T>
    where
        F: Future<Output = CorpusResult<T>>,
    {
        let cell = self.entry(key).await;
        let _guard = cell.lock().await;
        debug!(key, "acquired advisory lock");
        body.await
    }
}
