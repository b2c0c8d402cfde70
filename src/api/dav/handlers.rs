/*
 * Responsibility
 * - 認証後の DAV リクエストの受け口
 * - 実際の CalDAV/CardDAV 処理はホスト側の責務。ここでは誰として処理されるかだけを返す
 */
use axum::{
    Json,
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
};
use serde::Serialize;

use crate::api::extractors::AuthCtxExtractor;

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub principal: String,
    pub method: String,
    pub path: String,
}

pub async fn dispatch(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    method: Method,
    uri: Uri,
) -> impl IntoResponse {
    tracing::debug!(principal = %ctx.principal, %method, path = %uri.path(), "dispatching DAV request");

    (
        StatusCode::OK,
        Json(DispatchResponse {
            principal: ctx.principal,
            method: method.to_string(),
            path: uri.path().to_string(),
        }),
    )
}
