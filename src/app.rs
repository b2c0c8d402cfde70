/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (whitelist → Basic auth → dispatch, HTTP 共通 layer)
 * - axum::serve() で起動 (peer address を ConnectInfo で渡す)
 */
use std::net::SocketAddr;
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::repos::{PgUserRepo, UserStore};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,audit=info,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get lost
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    match &config.whitelist {
        Some(whitelist) => tracing::warn!(
            header = %whitelist.header_name,
            default_principal = %whitelist.default_principal,
            "trusted-network whitelist enabled; marked requests skip password verification"
        ),
        None => tracing::info!("trusted-network whitelist disabled"),
    }

    tracing::info!(
        "starting DAV auth front in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("connecting to the user database")?;

    let users: Arc<dyn UserStore> = Arc::new(PgUserRepo::new(pool));

    Ok(AppState::new(
        &config.auth_realm,
        config.whitelist.as_ref(),
        users,
    ))
}

pub fn build_router(state: AppState) -> Router {
    let dav = middleware::apply_pre_dispatch(api::dav::routes(), state.clone());

    // Routes added after the hooks are not wrapped by them.
    let router = dav
        .route("/health", get(api::health::health))
        .with_state(state);

    middleware::http::apply(router)
}
