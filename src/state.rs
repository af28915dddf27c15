use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    auth::jwt::JwtKeys,
    cache::Cache,
    config::AppConfig,
    users::{
        repo::{PgUserRepository, UserRepository},
        services::{DefaultUserService, UserService},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserService>,
    pub jwt: JwtKeys,
    /// `None` when the cache was unreachable at startup.
    pub cache: Option<Cache>,
}

impl AppState {
    /// Wires data access, business logic and the handler state together.
    pub fn init(config: Arc<AppConfig>, db: PgPool, cache: Option<Cache>) -> Self {
        let repo = Arc::new(PgUserRepository::new(db)) as Arc<dyn UserRepository>;
        let users = Arc::new(DefaultUserService::new(repo)) as Arc<dyn UserService>;
        Self::from_parts(config, users, cache)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserService>,
        cache: Option<Cache>,
    ) -> Self {
        let jwt = JwtKeys::from(&config.jwt);
        Self {
            config,
            users,
            jwt,
            cache,
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

#[cfg(test)]
impl AppState {
    /// State over an in-memory repository, no store or cache.
    pub(crate) fn fake() -> (Self, Arc<crate::users::repo::memory::MemoryUserRepository>) {
        use crate::{config::JwtConfig, users::repo::memory::MemoryUserRepository};

        let repo = Arc::new(MemoryUserRepository::default());
        let users = Arc::new(DefaultUserService::new(repo.clone())) as Arc<dyn UserService>;
        let config = Arc::new(AppConfig {
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            ..AppConfig::default()
        });
        (Self::from_parts(config, users, None), repo)
    }
}
