use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::users::{
    repo::{RepoError, UserRepository},
    repo_types::{NewUser, Role, User, STATUS_ACTIVE},
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("user not found")]
    NotFound,
    /// Shared by unknown-username and wrong-password so callers cannot tell
    /// the two apart.
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username already exists")]
    UsernameExists,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Database(RepoError),
}

impl From<RepoError> for ServiceError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => ServiceError::NotFound,
            other => ServiceError::Database(other),
        }
    }
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user_by_id(&self, id: i64) -> Result<User, ServiceError>;
    /// Returns the full record, hash included; do not pass it to output.
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, ServiceError>;
    async fn create_user(
        &self,
        username: &str,
        password: &str,
        email: &str,
        role: Role,
    ) -> Result<User, ServiceError>;
}

#[derive(Clone)]
pub struct DefaultUserService {
    repo: Arc<dyn UserRepository>,
}

impl DefaultUserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UserService for DefaultUserService {
    async fn get_user_by_id(&self, id: i64) -> Result<User, ServiceError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    #[instrument(skip(self, password))]
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let user = match self.repo.find_by_username(username).await {
            Ok(u) => u,
            Err(RepoError::NotFound) => {
                warn!("login unknown username");
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "find_by_username failed");
                return Err(e.into());
            }
        };

        let ok = verify_password(password, &user.password_hash).map_err(|e| {
            error!(error = %e, user_id = user.id, "verify_password failed");
            ServiceError::Hashing(e.to_string())
        })?;
        if !ok {
            warn!(user_id = user.id, "login invalid password");
            return Err(ServiceError::InvalidCredentials);
        }

        debug!(user_id = user.id, "credentials verified");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    async fn create_user(
        &self,
        username: &str,
        password: &str,
        email: &str,
        role: Role,
    ) -> Result<User, ServiceError> {
        match self.repo.find_by_username(username).await {
            Ok(_) => {
                warn!("username already taken");
                return Err(ServiceError::UsernameExists);
            }
            Err(RepoError::NotFound) => {}
            Err(e) => {
                error!(error = %e, "find_by_username failed");
                return Err(e.into());
            }
        }

        let password_hash = hash_password(password).map_err(|e| {
            error!(error = %e, "hash_password failed");
            ServiceError::Hashing(e.to_string())
        })?;

        let user = self
            .repo
            .create(&NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role,
                status: STATUS_ACTIVE,
            })
            .await
            .map_err(|e| {
                error!(error = %e, "create user failed");
                ServiceError::from(e)
            })?;

        info!(user_id = user.id, role = %user.role, "user created");
        Ok(user)
    }
}
