/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - realm, whitelist (無効なら None), trust context store, auth gate
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::config::WhitelistConfig;
use crate::repos::UserStore;
use crate::services::auth::{AuthGate, DigestPasswordBackend};
use crate::services::whitelist::{TrustContextStore, Whitelist};

#[derive(Clone, Debug)]
pub struct AppState {
    pub realm: Arc<str>,
    pub whitelist: Option<Arc<Whitelist>>,
    pub trust_ctx: TrustContextStore,
    pub auth_gate: Arc<AuthGate>,
}

impl AppState {
    pub fn new(
        realm: &str,
        whitelist: Option<&WhitelistConfig>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let realm: Arc<str> = Arc::from(realm);
        let trust_ctx = TrustContextStore::new();
        let passwords = Arc::new(DigestPasswordBackend::new(users.clone(), realm.clone()));
        let auth_gate = Arc::new(AuthGate::new(trust_ctx.clone(), users, passwords));

        Self {
            realm,
            whitelist: whitelist.map(|config| Arc::new(Whitelist::new(config))),
            trust_ctx,
            auth_gate,
        }
    }
}
