/*
 * Responsibility
 * - Decide which principal a trusted request is attributed to
 *   1. collection path  (/<kind>/<principal>/...)
 *   2. client-supplied Basic credentials
 *   3. operator-configured default principal
 * - The principal is not validated here; the user store decides whether it exists
 * - A collection segment that is not UTF-8 after decoding names nobody; it is
 *   logged as its own event and resolution moves on to the next source
 */
use std::sync::Arc;

use axum::http::HeaderMap;
use percent_encoding::percent_decode_str;

use super::context::PrincipalSource;
use crate::services::auth::credentials;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrincipal {
    pub principal: String,
    pub source: PrincipalSource,
}

#[derive(Debug, PartialEq, Eq)]
enum PathPrincipal {
    NoMatch,
    Undecodable,
    Found(String),
}

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    // e.g. "/dav.php"; empty when DAV is served from the root
    base_path: String,
    collection_kinds: Arc<[String]>,
    default_principal: String,
}

impl IdentityResolver {
    pub fn new(
        base_path: impl Into<String>,
        collection_kinds: Vec<String>,
        default_principal: impl Into<String>,
    ) -> Self {
        let base_path: String = base_path.into();
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
            collection_kinds: Arc::from(collection_kinds),
            default_principal: default_principal.into(),
        }
    }

    pub fn resolve(&self, path: &str, headers: &HeaderMap) -> ResolvedPrincipal {
        match self.principal_from_path(path) {
            PathPrincipal::Found(principal) => {
                return ResolvedPrincipal {
                    principal,
                    source: PrincipalSource::Derived,
                };
            }
            PathPrincipal::Undecodable => {
                tracing::warn!(
                    event = "whitelist.undecodable_principal",
                    path = %path,
                    "collection path names a principal that is not valid UTF-8; ignoring it"
                );
            }
            PathPrincipal::NoMatch => {}
        }

        if let Some(creds) = credentials::parse_basic(headers)
            && !creds.username.is_empty()
        {
            return ResolvedPrincipal {
                principal: creds.username,
                source: PrincipalSource::Provided,
            };
        }

        tracing::info!(
            event = "whitelist.default_principal",
            principal = %self.default_principal,
            path = %path,
            "no identity in trusted request; falling back to configured default principal"
        );
        ResolvedPrincipal {
            principal: self.default_principal.clone(),
            source: PrincipalSource::Default,
        }
    }

    fn principal_from_path(&self, path: &str) -> PathPrincipal {
        let Some(raw) = self.principal_segment(path) else {
            return PathPrincipal::NoMatch;
        };

        match percent_decode_str(raw).decode_utf8() {
            Ok(decoded) if decoded.is_empty() => PathPrincipal::NoMatch,
            Ok(decoded) => PathPrincipal::Found(decoded.into_owned()),
            Err(_) => PathPrincipal::Undecodable,
        }
    }

    // raw `<principal>` of `/<kind>/<principal>/...`, still percent-encoded
    fn principal_segment<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = if self.base_path.is_empty() {
            path
        } else {
            // "/dav.php" must not match "/dav.phpx/..."
            path.strip_prefix(self.base_path.as_str())
                .filter(|rest| rest.starts_with('/'))?
        };

        let mut segments = rest.strip_prefix('/')?.split('/');
        let kind = segments.next()?;
        if !self.collection_kinds.iter().any(|known| known == kind) {
            return None;
        }

        segments.next().filter(|segment| !segment.is_empty())
    }
}
