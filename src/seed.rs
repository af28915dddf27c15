use tracing::info;

use crate::users::{
    repo_types::{Role, User},
    services::{ServiceError, UserService},
};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@learnhub.local";
pub const DEFAULT_ADMIN_PASSWORD: &str = "Admin@123";

#[derive(Debug)]
pub enum SeedOutcome {
    Created(User),
    AlreadyExists,
}

/// Creates the administrator account unless one already exists. Safe to
/// run repeatedly: later runs perform no write.
pub async fn seed_admin(users: &dyn UserService, password: &str) -> Result<SeedOutcome, ServiceError> {
    match users
        .create_user(ADMIN_USERNAME, password, ADMIN_EMAIL, Role::Admin)
        .await
    {
        Ok(user) => {
            info!(user_id = user.id, username = ADMIN_USERNAME, email = ADMIN_EMAIL, "admin user created");
            Ok(SeedOutcome::Created(user))
        }
        Err(ServiceError::UsernameExists) => {
            info!(username = ADMIN_USERNAME, "admin user already exists; skipping");
            Ok(SeedOutcome::AlreadyExists)
        }
        Err(e) => Err(e),
    }
}
