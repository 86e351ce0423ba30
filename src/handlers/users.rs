//! `/users` endpoints: register, me, profile update, account deletion.

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::{ApiJson, AuthUser};
use crate::models::profile::{ProfileDetail, ProfileUpdate};
use crate::models::user::{MeResponse, RegisterRequest, UserCreated};

/// POST /api/v1/users
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserCreated>), AppError> {
    let user = state.users.register(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/me
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    Ok(Json(state.users.me(user_id).await?))
}

/// PATCH /api/v1/users/me/profile
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<ProfileUpdate>,
) -> Result<Json<ProfileDetail>, AppError> {
    Ok(Json(state.profiles.update(user_id, body).await?))
}

/// DELETE /api/v1/users/me
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, AppError> {
    state.users.delete(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
