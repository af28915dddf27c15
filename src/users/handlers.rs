use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    state::AppState,
    users::{
        dto::{CreateUserRequest, Data, PublicUser},
        services::ServiceError,
    },
};

pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/me", get(get_me))
        .route("/users/:id", get(get_user))
}

/// GET /users/:id
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Data<PublicUser>>, ApiError> {
    // Digits only: `u32::from_str` would also take a leading `+`.
    let parsed = if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        None
    } else {
        id.parse::<u32>().ok()
    };
    let Some(id) = parsed else {
        warn!(%id, "invalid user id");
        return Err(ApiError::invalid_parameter("invalid user id"));
    };

    // Any failed lookup of a well-formed id is reported as a missing user.
    match state.users.get_user_by_id(i64::from(id)).await {
        Ok(user) => Ok(Json(Data::new(user.into()))),
        Err(ServiceError::NotFound) => Err(ApiError::not_found("user not found")),
        Err(e) => {
            error!(error = %e, user_id = id, "user lookup failed");
            Err(ApiError::not_found("user not found"))
        }
    }
}

/// GET /users/me
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Data<PublicUser>>, ApiError> {
    match state.users.get_user_by_id(auth.id).await {
        Ok(user) => Ok(Json(Data::new(user.into()))),
        Err(ServiceError::NotFound) => {
            warn!(user_id = auth.id, "token for missing user");
            Err(ApiError::unauthorized("user not found"))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /users, admin only.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Data<PublicUser>>), ApiError> {
    auth.require_admin()?;

    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.is_empty() || payload.username.chars().count() > USERNAME_MAX_LEN {
        warn!("invalid username length");
        return Err(ApiError::invalid_parameter(format!(
            "username must be 1 to {USERNAME_MAX_LEN} characters"
        )));
    }
    if payload.password.chars().count() < PASSWORD_MIN_LEN {
        warn!("password too short");
        return Err(ApiError::invalid_parameter(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    if !payload.email.is_empty() && !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::invalid_parameter("invalid email"));
    }

    let user = state
        .users
        .create_user(&payload.username, &payload.password, &payload.email, payload.role)
        .await?;

    info!(user_id = user.id, created_by = auth.id, "user created via api");
    Ok((StatusCode::CREATED, Json(Data::new(user.into()))))
}
