use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse},
        jwt::JwtKeys,
    },
    error::ApiError,
    state::AppState,
    users::{dto::PublicUser, services::ServiceError},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::invalid_parameter("username and password are required"));
    }

    let user = state.users.authenticate(username, &payload.password).await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id, user.role).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        ApiError::internal()
    })?;
    let refresh_token = keys.sign_refresh(user.id, user.role).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        ApiError::internal()
    })?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        expires_in: keys.access_ttl.as_secs(),
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        ApiError::unauthorized("invalid or expired refresh token")
    })?;

    // Role comes from the current record, not the old token.
    let user = match state.users.get_user_by_id(claims.sub).await {
        Ok(u) => u,
        Err(ServiceError::NotFound) => {
            warn!(user_id = claims.sub, "refresh for missing user");
            return Err(ApiError::unauthorized("user not found"));
        }
        Err(e) => return Err(e.into()),
    };

    let access_token = keys
        .sign_access(user.id, user.role)
        .map_err(|_| ApiError::internal())?;
    let refresh_token = keys
        .sign_refresh(user.id, user.role)
        .map_err(|_| ApiError::internal())?;

    Ok(Json(RefreshResponse {
        access_token,
        refresh_token,
        expires_in: keys.access_ttl.as_secs(),
    }))
}
