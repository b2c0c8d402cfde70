/*!
 * Trusted-network whitelist
 *
 * Responsibility:
 * - Bundle the pieces the interceptor needs: trust marker, identity
 *   resolution, administrative path exclusions
 * - Build them once from `WhitelistConfig` at startup
 *
 * Public API:
 * - Whitelist
 * - TrustContextStore / RequestScope / TrustDecision / PrincipalSource
 */
pub mod audit;
pub mod context;
pub mod identity;
pub mod signal;

use std::sync::Arc;

pub use context::{PrincipalSource, RequestScope, TrustContextStore, TrustDecision};
use identity::IdentityResolver;
use signal::TrustSignal;

use crate::config::WhitelistConfig;

#[derive(Debug, Clone)]
pub struct Whitelist {
    signal: TrustSignal,
    identity: IdentityResolver,
    admin_paths: Arc<[String]>,
    inject_authorization: bool,
}

impl Whitelist {
    pub fn new(config: &WhitelistConfig) -> Self {
        Self {
            signal: TrustSignal::new(config.header_name.clone(), config.header_value.clone()),
            identity: IdentityResolver::new(
                config.dav_base_path.clone(),
                config.collection_kinds.clone(),
                config.default_principal.clone(),
            ),
            admin_paths: Arc::from(config.admin_paths.clone()),
            inject_authorization: config.inject_authorization,
        }
    }

    pub fn signal(&self) -> &TrustSignal {
        &self.signal
    }

    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    pub fn inject_authorization(&self) -> bool {
        self.inject_authorization
    }

    /// Host-administrative paths are never auto-trusted or auto-identified.
    pub fn is_admin_path(&self, path: &str) -> bool {
        self.admin_paths.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            if prefix.is_empty() {
                return false;
            }
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}
