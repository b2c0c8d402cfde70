//! HTTP Basic 認証 → AuthGate で検証 → AuthCtx を extensions に入れる
//!
//! - whitelist interceptor が付けた `RequestScope` があれば AuthGate に渡す
//! - 拒否理由に関わらず同じ 401 challenge を返す

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::credentials;
use crate::services::whitelist::RequestScope;
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, basic_auth_middleware))
}

async fn basic_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let creds =
        credentials::parse_basic(req.headers()).ok_or_else(|| AppError::unauthorized(&state.realm))?;

    let scope = req.extensions().get::<RequestScope>().copied();

    let principal = state
        .auth_gate
        .verify(scope, &creds.username, &creds.password)
        .await
        .authenticated_principal()
        .ok_or_else(|| {
            tracing::info!(username = %creds.username, "authentication failed");
            AppError::unauthorized(&state.realm)
        })?;

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(principal));

    Ok(next.run(req).await)
}
