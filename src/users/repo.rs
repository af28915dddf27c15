use async_trait::async_trait;
use sqlx::PgPool;

use crate::users::repo_types::{NewUser, UnknownRole, User, UserRow};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    #[error("invalid stored row: {0}")]
    InvalidRow(#[from] UnknownRole),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<User, RepoError>;
    async fn find_by_username(&self, username: &str) -> Result<User, RepoError>;
    /// Fails with the store's error when `username` is already taken.
    async fn create(&self, user: &NewUser) -> Result<User, RepoError>;
    /// Full-record save keyed by `user.id`.
    async fn update(&self, user: &User) -> Result<User, RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, role, status,
                   last_login_at, created_at, updated_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.ok_or(RepoError::NotFound)?.try_into()?)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, role, status,
                   last_login_at, created_at, updated_at
            FROM users
            WHERE username = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.ok_or(RepoError::NotFound)?.try_into()?)
    }

    async fn create(&self, user: &NewUser) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, role, status,
                      last_login_at, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.status)
        .fetch_one(&self.db)
        .await?;
        Ok(row.try_into()?)
    }

    async fn update(&self, user: &User) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, role = $5,
                status = $6, last_login_at = $7, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, username, email, password_hash, role, status,
                      last_login_at, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.status)
        .bind(user.last_login_at)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.ok_or(RepoError::NotFound)?.try_into()?)
    }
}
