/*
 * Responsibility
 * - DAV の URL 構造を定義 (全パス・全メソッドを dispatch に流す)
 * - whitelist / auth hook は middleware::apply_pre_dispatch で外側から掛ける
 */
use axum::{Router, routing::any};

use crate::state::AppState;

use super::handlers::dispatch;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", any(dispatch))
        .route("/{*path}", any(dispatch))
}
