//! User directory
//!
//! The credential-verification collaborator: checks username/password
//! pairs and resolves user ids back to users. Passwords are argon2-hashed.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use corpus_core::{CorpusResult, Error, Permission};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    password_hash: String,
    pub permissions: Vec<Permission>,
}

impl UserRecord {
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }
}

#[derive(Default)]
pub struct UserDirectory {
    // username -> record
    users: RwLock<HashMap<String, UserRecord>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &self,
        username: &str,
        password: &str,
        permissions: Vec<Permission>,
    ) -> CorpusResult<String> {
        if username.is_empty() || password.is_empty() {
            return Err(Error::invalid());
        }
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            permissions,
        };
        let id = record.id.clone();
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(Error::BadRequest("username taken".to_string()));
        }
        info!(username, "created user");
        users.insert(username.to_string(), record);
        Ok(id)
    }

    /// Verify a username/password pair.
    pub async fn verify_login(&self, username: &str, password: &str) -> Option<UserRecord> {
        let users = self.users.read().await;
        let record = users.get(username)?;
        if record.verify_password(password) {
            Some(record.clone())
        } else {
            debug!(username, "password verification failed");
            None
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<UserRecord> {
        let users = self.users.read().await;
        users.values().find(|u| u.id == user_id).cloned()
    }
}

fn hash_password(password: &str) -> CorpusResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verifies_correct_password_only() {
        let directory = UserDirectory::new();
        directory
            .insert("test", "test", vec![Permission::Admin])
            .await
            .unwrap();

        assert!(directory.verify_login("test", "test").await.is_some());
        assert!(directory.verify_login("test", "wrong").await.is_none());
        assert!(directory.verify_login("ghost", "test").await.is_none());
    }

    #[tokio::test]
    async fn resolves_user_by_id() {
        let directory = UserDirectory::new();
        let id = directory
            .insert("editor", "hunter2", vec![Permission::Edit("products".to_string())])
            .await
            .unwrap();

        let record = directory.get(&id).await.unwrap();
        assert_eq!(record.username, "editor");
        assert!(directory.get("nope").await.is_none());
    }
}
