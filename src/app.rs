/*
 * Responsibility
 * - Config 読み込み → verifier 生成 (起動時 1 回) → Router 組み立て
 * - Middleware の適用順: http → verify → enforce → handler
 * - axum::serve() で起動 (ConnectInfo 付き: API key の接続元チェック用)
 */
use std::net::SocketAddr;
use std::time::Duration;
use std::{panic, process};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{Config, LogFormat};
use crate::middleware;
use crate::middleware::auth::EnforcePolicy;
use crate::services::auth::build_verifier;
use crate::state::AppState;

fn init_tracing(format: LogFormat) {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,authgate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Console => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr は起動方法によっては見えないので tracing にも必ず流す
        tracing::error!(?info, "panic");

        // development: 即落として気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting authgate in {:?} mode on {} (auth: {}, enforce: {})",
        config.app_env,
        config.addr,
        config.auth_mode.name(),
        config.enforce_auth
    );

    let state = build_state(&config).await?;
    let app = build_router(&state, Duration::from_secs(config.http_timeout_seconds));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Trust material is loaded here, once. Any failure aborts startup.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let verifier = build_verifier(&config.auth_mode)
        .await
        .context("failed to initialize auth verifier")?;

    Ok(AppState::new(verifier, EnforcePolicy::new(config.enforce_auth)))
}

pub fn build_router(state: &AppState, timeout: Duration) -> Router {
    async fn health() -> &'static str {
        "ok"
    }

    // layer は後に積んだものが外側になる: verify → enforce → handler
    let v1 = api::v1::routes();
    let v1 = middleware::auth::enforce::apply(v1, state.enforce);
    let v1 = middleware::auth::verify::apply(v1, state.verifier.clone());

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1);

    middleware::http::apply(router, timeout)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
