//! Session store
//!
//! Boundary of the cookie-session subsystem the gateway composes with.
//! Each session carries the CSRF token that unsafe cookie-authenticated
//! requests must echo back.

use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "corpus-session";
/// Header carrying the CSRF token for unsafe session-authenticated
/// requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: String,
    pub csrf_token: String,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session; returns (session id, CSRF token).
    pub async fn create(&self, user_id: &str) -> (String, String) {
        let sid = Uuid::new_v4().simple().to_string();
        let csrf_token = Uuid::new_v4().simple().to_string();
        self.sessions.write().await.insert(
            sid.clone(),
            SessionRecord {
                user_id: user_id.to_string(),
                csrf_token: csrf_token.clone(),
            },
        );
        (sid, csrf_token)
    }

    pub async fn get(&self, sid: &str) -> Option<SessionRecord> {
        self.sessions.read().await.get(sid).cloned()
    }

    pub async fn destroy(&self, sid: &str) {
        self.sessions.write().await.remove(sid);
    }
}
