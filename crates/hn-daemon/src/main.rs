//! hn-daemon entry point.
//!
//! Kept thin: config, tracing, store pool, shared state, middleware, serve.
//! Handlers live in `routes.rs`; shared state types live in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use hn_daemon::{routes, state};
use hn_db::{ConfiguredPrincipal, PgMutationGateway};
use hn_reactive::HttpReactiveClient;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Dev convenience; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let loaded = hn_config::load_from_env().context("config load failed")?;
    info!(config_hash = %loaded.config_hash, "config loaded");
    let cfg = loaded.config;

    let secrets = hn_config::resolve_secrets(&cfg)?;
    let pool = hn_db::connect(&cfg.db, &secrets).await?;

    match hn_db::status(&pool).await {
        Ok(s) if s.schema_present() => info!("store schema present"),
        Ok(s) => warn!(
            posts = s.has_posts_table,
            upvotes = s.has_upvotes_table,
            users = s.has_users_table,
            "store schema incomplete; mutations will fail"
        ),
        Err(e) => warn!(error = %format!("{e:#}"), "store status check failed"),
    }

    let reactive = HttpReactiveClient::new(
        &cfg.reactive.base_url,
        Duration::from_millis(cfg.reactive.timeout_ms),
    )?;
    info!(base_url = reactive.base_url(), "reactive backend configured");

    let gateway = PgMutationGateway::new(
        pool,
        Duration::from_millis(cfg.db.statement_timeout_ms),
    );
    let principal = ConfiguredPrincipal::from_config(&cfg.principal);

    let shared = Arc::new(state::AppState::new(
        Arc::new(reactive),
        Arc::new(gateway),
        Arc::new(principal),
        &cfg,
    ));

    let app = routes::build_router(Arc::clone(&shared)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let addr: SocketAddr = cfg
        .daemon
        .addr
        .parse()
        .with_context(|| format!("invalid daemon.addr '{}'", cfg.daemon.addr))?;
    info!(
        version = shared.build.version,
        "{} listening on http://{}", shared.build.service, addr
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler failed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
