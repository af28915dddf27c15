use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use learnhub::{
    app::{build_app, release_within, serve, shutdown_signal, RELEASE_TIMEOUT},
    cache::Cache,
    config::AppConfig,
    db,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Arc::new(AppConfig::load()?);
    learnhub::init_tracing(config.server.is_release());
    tracing::info!(mode = %config.server.mode, "configuration loaded");

    if config.jwt.secret.is_empty() {
        anyhow::bail!("jwt.secret is empty; set LEARNHUB_JWT__SECRET");
    }

    let pool = db::connect(&config.database).await?;
    let cache = Cache::connect_optional(&config.redis).await;

    let state = AppState::init(config.clone(), pool.clone(), cache);
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("parse listen address")?;
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    let served = serve(listener, app, shutdown_signal()).await;

    // Released whether or not the server exited cleanly.
    release_within("database pool", RELEASE_TIMEOUT, pool.close()).await;
    tracing::info!("shutdown complete");

    served
}
