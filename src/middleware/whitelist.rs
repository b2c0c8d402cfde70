//! Trusted-network interceptor: classify → resolve identity → propagate.
//!
//! Runs once per request before the authentication phase. It never rejects a
//! request; its only effects are the decision stored under the request's
//! scope, a synthesized `Authorization` header when the client sent none, and
//! an audit record.
//!
//! The scope guard is held until the downstream response is produced, so the
//! decision disappears with the request (also when the client disconnects
//! and the future is dropped).

use std::net::SocketAddr;

use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
};

use crate::services::auth::credentials;
use crate::services::whitelist::{RequestScope, TrustContextStore, TrustDecision, Whitelist, audit};
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, whitelist_middleware))
}

async fn whitelist_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(whitelist) = state.whitelist.as_deref() else {
        return next.run(req).await;
    };

    if whitelist.is_admin_path(req.uri().path()) {
        tracing::debug!(path = %req.uri().path(), "administrative path; whitelist skipped");
        return next.run(req).await;
    }

    let guard = state.trust_ctx.open();
    let scope = guard.scope();
    req.extensions_mut().insert(scope);

    let decision = intercept(whitelist, &state.trust_ctx, scope, &mut req);
    tracing::debug!(%scope, trusted = decision.is_trusted(), "request classified");

    let response = next.run(req).await;
    drop(guard);
    response
}

/// Classify `req`, record the decision under `scope`, and rewrite the request
/// for trusted callers.
pub(crate) fn intercept(
    whitelist: &Whitelist,
    trust_ctx: &TrustContextStore,
    scope: RequestScope,
    req: &mut Request,
) -> TrustDecision {
    if !whitelist.signal().read(req.headers()) {
        trust_ctx.set(scope, TrustDecision::Untrusted);
        return TrustDecision::Untrusted;
    }

    let resolved = whitelist
        .identity()
        .resolve(req.uri().path(), req.headers());

    // Downstream code that only looks at the request sees the same principal.
    // Credentials the client sent itself are never replaced.
    if whitelist.inject_authorization() && !req.headers().contains_key(header::AUTHORIZATION) {
        match credentials::basic_header_value(&resolved.principal, "") {
            Ok(value) => {
                req.headers_mut().insert(header::AUTHORIZATION, value);
            }
            Err(err) => {
                tracing::warn!(error = ?err, principal = %resolved.principal, "cannot encode synthesized credentials");
            }
        }
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = audit::client_addr(req.headers(), peer);
    audit::record_trusted(&client, &resolved, scope);

    let decision = TrustDecision::Trusted {
        principal: resolved.principal,
        source: resolved.source,
    };
    trust_ctx.set(scope, decision.clone());
    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{HeaderName, HeaderValue};

    use crate::config::WhitelistConfig;
    use crate::services::whitelist::PrincipalSource;

    fn whitelist(inject_authorization: bool) -> Whitelist {
        Whitelist::new(&WhitelistConfig {
            header_name: HeaderName::from_static("x-baikal-whitelist"),
            header_value: HeaderValue::from_static("1"),
            default_principal: "frontdesk".to_string(),
            admin_paths: vec!["/admin/".to_string()],
            collection_kinds: vec!["calendars".to_string(), "addressbooks".to_string()],
            dav_base_path: String::new(),
            inject_authorization,
        })
    }

    fn request(path: &str, marker: Option<&'static str>) -> Request {
        let mut builder = axum::http::Request::builder()
            .method("PROPFIND")
            .uri(path);
        if let Some(marker) = marker {
            builder = builder.header("x-baikal-whitelist", marker);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn authorization(req: &Request) -> Option<credentials::BasicCredentials> {
        credentials::parse_basic(req.headers())
    }

    #[test]
    fn untrusted_request_is_recorded_and_left_alone() {
        let ctx = TrustContextStore::new();
        let guard = ctx.open();
        let mut req = request("/calendars/alice/", Some("0"));

        let decision = intercept(&whitelist(true), &ctx, guard.scope(), &mut req);

        assert_eq!(decision, TrustDecision::Untrusted);
        assert_eq!(ctx.get(guard.scope()), Some(TrustDecision::Untrusted));
        assert!(req.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn trusted_collection_request_gets_principal_credentials() {
        let ctx = TrustContextStore::new();
        let guard = ctx.open();
        let mut req = request("/calendars/alice/", Some("1"));

        let decision = intercept(&whitelist(true), &ctx, guard.scope(), &mut req);

        let expected = TrustDecision::Trusted {
            principal: "alice".to_string(),
            source: PrincipalSource::Derived,
        };
        assert_eq!(decision, expected);
        assert_eq!(ctx.get(guard.scope()), Some(expected));

        let creds = authorization(&req).expect("synthesized credentials");
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "");
    }

    #[test]
    fn client_credentials_survive_a_derived_principal() {
        let ctx = TrustContextStore::new();
        let guard = ctx.open();
        let mut req = request("/addressbooks/alice/contacts/", Some("1"));
        let original = credentials::basic_header_value("bob", "hunter2").unwrap();
        req.headers_mut()
            .insert(header::AUTHORIZATION, original.clone());

        let decision = intercept(&whitelist(true), &ctx, guard.scope(), &mut req);

        assert_eq!(
            decision,
            TrustDecision::Trusted {
                principal: "alice".to_string(),
                source: PrincipalSource::Derived,
            }
        );
        assert_eq!(req.headers().get(header::AUTHORIZATION), Some(&original));
    }

    #[test]
    fn non_basic_authorization_is_not_replaced() {
        let ctx = TrustContextStore::new();
        let guard = ctx.open();
        let mut req = request("/calendars/alice/", Some("1"));
        let original = HeaderValue::from_static("Bearer opaque");
        req.headers_mut()
            .insert(header::AUTHORIZATION, original.clone());

        intercept(&whitelist(true), &ctx, guard.scope(), &mut req);

        assert_eq!(req.headers().get(header::AUTHORIZATION), Some(&original));
    }

    #[test]
    fn provided_credentials_are_kept() {
        let ctx = TrustContextStore::new();
        let guard = ctx.open();
        let mut req = request("/principals/", Some("1"));
        let original = credentials::basic_header_value("bob", "hunter2").unwrap();
        req.headers_mut()
            .insert(header::AUTHORIZATION, original.clone());

        let decision = intercept(&whitelist(true), &ctx, guard.scope(), &mut req);

        assert_eq!(
            decision,
            TrustDecision::Trusted {
                principal: "bob".to_string(),
                source: PrincipalSource::Provided,
            }
        );
        assert_eq!(req.headers().get(header::AUTHORIZATION), Some(&original));
    }

    #[test]
    fn default_principal_is_used_without_identity() {
        let ctx = TrustContextStore::new();
        let guard = ctx.open();
        let mut req = request("/.well-known/caldav", Some("1"));

        let decision = intercept(&whitelist(true), &ctx, guard.scope(), &mut req);

        assert_eq!(
            decision,
            TrustDecision::Trusted {
                principal: "frontdesk".to_string(),
                source: PrincipalSource::Default,
            }
        );
        assert_eq!(authorization(&req).unwrap().username, "frontdesk");
    }

    #[test]
    fn injection_can_be_disabled() {
        let ctx = TrustContextStore::new();
        let guard = ctx.open();
        let mut req = request("/calendars/alice/", Some("1"));

        let decision = intercept(&whitelist(false), &ctx, guard.scope(), &mut req);

        assert!(decision.is_trusted());
        assert!(req.headers().get(header::AUTHORIZATION).is_none());
    }
}
