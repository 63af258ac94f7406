//! Bearer token credential store
//!
//! Issued on successful login, presented per request. Tokens are stored
//! hashed; the plaintext is returned exactly once at issue time. Expiry is
//! enforced at lookup time; the background sweep only keeps the
//! collection small.

use chrono::{DateTime, Duration, Utc};
use corpus_core::CorpusResult;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct TokenRecord {
    token_hash: String,
    user_id: String,
    expires_at: DateTime<Utc>,
}

pub struct BearerTokenStore {
    rows: RwLock<Vec<TokenRecord>>,
    lifetime: Duration,
}

impl BearerTokenStore {
    pub fn new(lifetime_days: i64) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            lifetime: Duration::days(lifetime_days),
        }
    }

    /// Issue a token for `user_id`. The returned plaintext is not
    /// recoverable afterwards.
    pub async fn issue(&self, user_id: &str) -> CorpusResult<String> {
        let token = format!("tok_{}", Uuid::new_v4().simple());
        let record = TokenRecord {
            token_hash: hash_token(&token),
            user_id: user_id.to_string(),
            expires_at: Utc::now() + self.lifetime,
        };
        self.rows.write().await.push(record);
        info!(user_id, "issued bearer token");
        Ok(token)
    }

    /// Resolve a presented token to its owning user id, filtering on
    /// `expires_at >= now` at query time.
    pub async fn lookup(&self, token: &str) -> CorpusResult<Option<String>> {
        let hash = hash_token(token);
        let now = Utc::now();
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|r| r.token_hash == hash && r.expires_at >= now)
            .map(|r| r.user_id.clone()))
    }

    /// Delete by the combination of user id and token, so a user can only
    /// revoke their own tokens. Returns whether anything was removed.
    pub async fn revoke(&self, user_id: &str, token: &str) -> CorpusResult<bool> {
        let hash = hash_token(token);
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !(r.user_id == user_id && r.token_hash == hash));
        let removed = rows.len() < before;
        if removed {
            info!(user_id, "revoked bearer token");
        }
        Ok(removed)
    }

    /// Best-effort removal of expired rows. Correctness does not depend
    /// on this running; `lookup` re-checks expiry.
    pub async fn sweep(&self) {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.expires_at >= now);
        if rows.len() < before {
            debug!(removed = before - rows.len(), "swept expired bearer tokens");
        }
    }

    /// Spawn the hourly expiry sweep.
    pub fn start_sweep(store: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                store.sweep().await;
            }
        })
    }

    #[cfg(test)]
    async fn force_expire(&self, token: &str) {
        let hash = hash_token(token);
        let mut rows = self.rows.write().await;
        for row in rows.iter_mut().filter(|r| r.token_hash == hash) {
            row.expires_at = Utc::now() - Duration::seconds(1);
        }
    }
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
