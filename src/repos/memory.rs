//! In-memory `UserStore` for tests.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_repo::{UserRow, UserStore};
use crate::services::auth::password::password_digest;

#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, UserRow>>>,
    // Simulates the database being unreachable
    unavailable: Arc<AtomicBool>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, username: &str, realm: &str, password: &str) -> Self {
        self.insert(username, realm, password, true);
        self
    }

    pub fn insert(&self, username: &str, realm: &str, password: &str, enabled: bool) {
        let row = UserRow {
            username: username.to_string(),
            digest: password_digest(username, realm, password),
            enabled,
        };
        self.users
            .write()
            .unwrap()
            .insert(username.to_string(), row);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<UserRow>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(self.users.read().unwrap().get(username).cloned())
    }
}
