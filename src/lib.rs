pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod seed;
pub mod state;
pub mod users;

/// Installs the global subscriber. Release mode logs JSON.
pub fn init_tracing(release: bool) {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "learnhub=debug,migrate=debug,tower_http=info,sqlx=warn".to_string());

    if release {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}
