use std::{any::Any, future::Future, future::IntoFuture, sync::Arc, time::Duration};

use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Notify};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{auth, config::ServerConfig, error::ApiError, state::AppState, users};

/// How long in-flight requests may run after a shutdown signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Upper bound on releasing a resource once the server has stopped.
pub const RELEASE_TIMEOUT: Duration = Duration::from_secs(2);

pub fn build_app(state: AppState) -> Router {
    let server = state.config.server.clone();
    let router = Router::new()
        .route("/health", get(health))
        .nest(
            "/api/v1",
            Router::new()
                .merge(users::router())
                .merge(auth::router()),
        )
        .with_state(state);
    with_middleware(router, &server)
}

pub fn with_middleware(router: Router, cfg: &ServerConfig) -> Router {
    router
        .layer(TimeoutLayer::new(cfg.write_timeout()))
        .layer(RequestBodyTimeoutLayer::new(cfg.read_timeout()))
        .layer(CatchPanicLayer::custom(catch_panic))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "LearnHub API is running",
    }))
}

fn catch_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "<unknown>".into()
    };
    error!(panic = %detail, "request handler panicked");
    ApiError::internal().into_response()
}

pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    serve_with_grace(listener, app, shutdown, SHUTDOWN_GRACE).await
}

/// Serves until `shutdown` resolves, then stops accepting and waits up to
/// `grace` for in-flight requests before aborting the server.
pub async fn serve_with_grace<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let stop = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let stop = stop.clone();
        async move { stop.notified().await }
    });
    let mut handle = tokio::spawn(server.into_future());

    tokio::select! {
        res = &mut handle => {
            res??;
            return Ok(());
        }
        _ = shutdown => {}
    }

    info!(grace_secs = grace.as_secs_f64(), "shutting down; draining in-flight requests");
    stop.notify_one();

    match tokio::time::timeout(grace, &mut handle).await {
        Ok(res) => {
            res??;
            info!("server stopped gracefully");
        }
        Err(_) => {
            warn!("grace period elapsed; forcing remaining connections closed");
            handle.abort();
        }
    }
    Ok(())
}

/// Awaits `close` for at most `limit`. Returns `false` and logs a warning if
/// the resource was abandoned instead.
///
/// `PgPool::close` waits for every checked-out connection, and connection
/// tasks can outlive an aborted server, so the release step needs its own bound.
pub async fn release_within<F>(what: &str, limit: Duration, close: F) -> bool
where
    F: Future<Output = ()>,
{
    match tokio::time::timeout(limit, close).await {
        Ok(()) => {
            info!(resource = what, "released");
            true
        }
        Err(_) => {
            warn!(resource = what, limit_secs = limit.as_secs_f64(), "release timed out; abandoning");
            false
        }
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
