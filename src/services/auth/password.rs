//! Password verification backend (the untrusted path).
//!
//! Accounts store `hex(sha256("<username>:<realm>:<password>"))`, so a
//! realm change invalidates every stored password.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::repos::{RepoError, UserStore};

#[derive(Debug, thiserror::Error)]
pub enum AuthBackendError {
    #[error("account lookup failed")]
    Lookup(#[from] RepoError),

    #[error("stored digest for {username:?} is malformed")]
    InvalidDigest { username: String },
}

/// Pluggable username/password check consulted by `AuthGate` on the
/// untrusted path.
#[async_trait]
pub trait PasswordBackend: Send + Sync {
    // Returns:
    // - Ok(true)  => credentials are valid for an enabled account
    // - Ok(false) => unknown account, disabled account, or wrong password
    // - Err(_)    => backend failure (caller must deny)
    async fn validate_user_pass(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthBackendError>;
}

#[derive(Clone)]
pub struct DigestPasswordBackend {
    users: Arc<dyn UserStore>,
    realm: Arc<str>,
}

impl DigestPasswordBackend {
    pub fn new(users: Arc<dyn UserStore>, realm: impl Into<Arc<str>>) -> Self {
        Self {
            users,
            realm: realm.into(),
        }
    }
}

#[async_trait]
impl PasswordBackend for DigestPasswordBackend {
    async fn validate_user_pass(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthBackendError> {
        let Some(user) = self.users.find_by_username(username).await? else {
            return Ok(false);
        };
        if !user.enabled {
            return Ok(false);
        }

        let stored = parse_digest(&user.digest).ok_or_else(|| AuthBackendError::InvalidDigest {
            username: user.username.clone(),
        })?;
        let actual = digest_bytes(username, &self.realm, password);

        Ok(constant_time_eq_32(&stored, &actual))
    }
}

#[cfg(test)]
pub fn password_digest(username: &str, realm: &str, password: &str) -> String {
    hex::encode(digest_bytes(username, realm, password))
}

fn digest_bytes(username: &str, realm: &str, password: &str) -> [u8; 32] {
    Sha256::digest(format!("{username}:{realm}:{password}").as_bytes()).into()
}

fn parse_digest(stored: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(stored.trim()).ok()?;
    bytes.as_slice().try_into().ok()
}

fn constant_time_eq_32(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff: u8 = 0;
    for idx in 0..32 {
        diff |= a[idx] ^ b[idx];
    }
    diff == 0
}
