/*
 * Responsibility
 * - middleware の公開インターフェース
 * - pre-dispatch hook の登録順序をここで固定する
 */
pub mod auth;
pub mod http;
pub mod whitelist;

use axum::Router;

use crate::state::AppState;

/// Register the pre-dispatch hooks on the protocol routes.
///
/// Ordering contract: the whitelist interceptor runs first among all
/// pre-dispatch hooks, then Basic authentication, then dispatch. Layers wrap
/// outward, so the hook applied last runs first.
pub fn apply_pre_dispatch(router: Router<AppState>, state: AppState) -> Router<AppState> {
    let router = auth::basic::apply(router, state.clone());
    whitelist::apply(router, state)
}
