//! Per-request trust context shared between the whitelist interceptor and the
//! authentication phase.
//!
//! Responsibility:
//! - Hold exactly one `TrustDecision` per in-flight request, keyed by a
//!   `RequestScope` correlation id.
//! - Release the entry when the request ends (including cancellation) via
//!   `ScopeGuard`'s `Drop`.
//!
//! Notes:
//! - A scope with no decision reads as `None`; callers treat that as untrusted.
//! - Lock poisoning is recovered instead of propagated so a panicking request
//!   cannot take the whole pipeline down with it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

/// Correlation id of one request's processing lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestScope(Uuid);

impl RequestScope {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the principal of a trusted request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalSource {
    /// Extracted from a collection path (`/calendars/<principal>/...`).
    Derived,
    /// Operator-configured fallback.
    Default,
    /// Taken from credentials the client already sent.
    Provided,
}

impl PrincipalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Derived => "derived",
            Self::Default => "default",
            Self::Provided => "provided",
        }
    }
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustDecision {
    Untrusted,
    Trusted {
        principal: String,
        source: PrincipalSource,
    },
}

impl TrustDecision {
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted { .. })
    }
}

#[derive(Clone, Debug, Default)]
pub struct TrustContextStore {
    entries: Arc<RwLock<HashMap<RequestScope, TrustDecision>>>,
}

impl TrustContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh scope. The returned guard owns the scope's entry.
    pub fn open(&self) -> ScopeGuard {
        ScopeGuard {
            scope: RequestScope::fresh(),
            store: self.clone(),
        }
    }

    /// Record the decision for `scope`.
    ///
    /// A scope is classified once; a second `set` is ignored and returns `false`.
    pub fn set(&self, scope: RequestScope, decision: TrustDecision) -> bool {
        match self.write().entry(scope) {
            Entry::Occupied(_) => {
                tracing::warn!(%scope, "trust decision already recorded; ignoring reclassification");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(decision);
                true
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, scope: RequestScope) -> Option<TrustDecision> {
        self.read().get(&scope).cloned()
    }

    /// Consume the decision for `scope`. Later reads see `None`.
    pub fn take(&self, scope: RequestScope) -> Option<TrustDecision> {
        self.write().remove(&scope)
    }

    /// Number of live scopes holding a decision.
    pub fn live_scopes(&self) -> usize {
        self.read().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.live_scopes() == 0
    }

    fn release(&self, scope: RequestScope) {
        self.write().remove(&scope);
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RequestScope, TrustDecision>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RequestScope, TrustDecision>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns one request scope; dropping it discards the scope's decision.
#[derive(Debug)]
pub struct ScopeGuard {
    scope: RequestScope,
    store: TrustContextStore,
}

impl ScopeGuard {
    pub fn scope(&self) -> RequestScope {
        self.scope
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.store.release(self.scope);
    }
}
