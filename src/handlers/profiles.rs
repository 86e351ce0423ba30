//! `/profiles` endpoints.

use axum::{
    extract::State,
    Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::{ApiPath, ApiQuery, MaybeAuthUser};
use crate::models::profile::{ProfileDetail, ProfileListQuery, ProfileListResponse};

/// GET /api/v1/profiles
pub async fn list_profiles(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ApiQuery(query): ApiQuery<ProfileListQuery>,
) -> Result<Json<ProfileListResponse>, AppError> {
    Ok(Json(state.profiles.list(viewer, query).await?))
}

/// GET /api/v1/profiles/:user_id
pub async fn get_profile(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<ProfileDetail>, AppError> {
    Ok(Json(state.profiles.detail(viewer, user_id).await?))
}
