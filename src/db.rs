use std::time::Duration;

use anyhow::Context;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use tracing::info;

use crate::config::DatabaseConfig;

pub fn connect_options(cfg: &DatabaseConfig) -> PgConnectOptions {
    let mut opts = PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.username)
        .database(&cfg.database)
        .options([("client_encoding", cfg.charset.as_str())]);
    if !cfg.password.is_empty() {
        opts = opts.password(&cfg.password);
    }
    opts
}

/// Pool options derived from the configured bounds. Idle connections are
/// kept warm up to `max_idle_conns`, never above `max_open_conns`.
pub fn pool_options(cfg: &DatabaseConfig) -> PgPoolOptions {
    let max_open = cfg.max_open_conns.max(1);
    PgPoolOptions::new()
        .max_connections(max_open)
        .min_connections(cfg.max_idle_conns.min(max_open))
        .max_lifetime(Duration::from_secs(cfg.conn_max_lifetime_secs))
}

pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = pool_options(cfg)
        .connect_with(connect_options(cfg))
        .await
        .with_context(|| format!("connect to database {}:{}/{}", cfg.host, cfg.port, cfg.database))?;
    info!(
        host = %cfg.host,
        port = cfg.port,
        database = %cfg.database,
        max_open = cfg.max_open_conns,
        max_idle = cfg.max_idle_conns,
        "database pool ready"
    );
    Ok(pool)
}

pub async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run database migrations")?;
    Ok(())
}
