//! Audit trail for requests admitted through the whitelist.
//!
//! Records go to the `audit` tracing target; formatting and shipping belong to
//! the subscriber configured in `app.rs`.

use std::net::SocketAddr;

use axum::http::HeaderMap;
use chrono::{SecondsFormat, Utc};

use super::context::RequestScope;
use super::identity::ResolvedPrincipal;

const UNKNOWN_CLIENT: &str = "unknown";

/// Client address as seen by the proxy: first `X-Forwarded-For` hop, then the
/// socket peer.
pub fn client_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match (forwarded, peer) {
        (Some(hop), _) => hop.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => UNKNOWN_CLIENT.to_string(),
    }
}

pub fn record_trusted(client: &str, resolved: &ResolvedPrincipal, scope: RequestScope) {
    tracing::info!(
        target: "audit",
        event = "whitelist.trusted",
        client_addr = %client,
        principal = %resolved.principal,
        source = resolved.source.as_str(),
        request_scope = %scope,
        at = %Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "whitelisted request admitted without password check"
    );
}
