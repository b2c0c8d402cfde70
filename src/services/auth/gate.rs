//! Credential check consulted by the authentication phase.
//!
//! Trusted requests skip the password comparison but never the account
//! existence check, which runs on the username the authentication phase
//! supplies. Everything else goes to the password backend untouched. Every
//! failure denies.

use std::fmt;
use std::sync::Arc;

use crate::repos::UserStore;
use crate::services::auth::password::PasswordBackend;
use crate::services::whitelist::{PrincipalSource, RequestScope, TrustContextStore, TrustDecision};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub authenticated: bool,
    pub principal: Option<String>,
}

impl AuthOutcome {
    fn granted(principal: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            principal: Some(principal.into()),
        }
    }

    fn denied() -> Self {
        Self {
            authenticated: false,
            principal: None,
        }
    }

    /// Principal of a successful outcome.
    pub fn authenticated_principal(self) -> Option<String> {
        if self.authenticated {
            self.principal
        } else {
            None
        }
    }
}

#[derive(Clone)]
pub struct AuthGate {
    trust_ctx: TrustContextStore,
    users: Arc<dyn UserStore>,
    passwords: Arc<dyn PasswordBackend>,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("live_scopes", &self.trust_ctx.live_scopes())
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn new(
        trust_ctx: TrustContextStore,
        users: Arc<dyn UserStore>,
        passwords: Arc<dyn PasswordBackend>,
    ) -> Self {
        Self {
            trust_ctx,
            users,
            passwords,
        }
    }

    /// Verify `username`/`password` for the request identified by `scope`.
    ///
    /// The scope's trust decision is consumed; a second call for the same
    /// scope takes the password path.
    pub async fn verify(
        &self,
        scope: Option<RequestScope>,
        username: &str,
        password: &str,
    ) -> AuthOutcome {
        match scope.and_then(|scope| self.trust_ctx.take(scope)) {
            Some(TrustDecision::Trusted { principal, source }) => {
                self.verify_trusted(&principal, source, username).await
            }
            Some(TrustDecision::Untrusted) | None => self.verify_password(username, password).await,
        }
    }

    async fn verify_trusted(
        &self,
        principal: &str,
        source: PrincipalSource,
        username: &str,
    ) -> AuthOutcome {
        if username != principal {
            // e.g. a user opening someone else's shared collection with their own login
            tracing::debug!(
                principal = %principal,
                username = %username,
                source = source.as_str(),
                "credential username differs from resolved principal"
            );
        }

        match self.users.find_by_username(username).await {
            Ok(Some(user)) if user.enabled => AuthOutcome::granted(user.username),
            Ok(Some(_)) => {
                tracing::warn!(username = %username, "trusted account is disabled");
                AuthOutcome::denied()
            }
            Ok(None) => {
                tracing::warn!(
                    username = %username,
                    source = source.as_str(),
                    "trusted username has no account"
                );
                AuthOutcome::denied()
            }
            Err(err) => {
                tracing::error!(error = ?err, username = %username, "account lookup failed on trusted path");
                AuthOutcome::denied()
            }
        }
    }

    async fn verify_password(&self, username: &str, password: &str) -> AuthOutcome {
        match self.passwords.validate_user_pass(username, password).await {
            Ok(true) => AuthOutcome::granted(username),
            Ok(false) => AuthOutcome::denied(),
            Err(err) => {
                tracing::error!(error = ?err, username = %username, "password backend failure");
                AuthOutcome::denied()
            }
        }
    }
}
