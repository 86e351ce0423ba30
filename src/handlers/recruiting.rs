//! `/recruiting-posts` endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, AuthUser, MaybeAuthUser};
use crate::models::recruiting::{
    CreateRecruitingRequest, CreatedId, RecruitingDetail, RecruitingListQuery,
    RecruitingListResponse, StatusQuery, StatusResponse, UpdateRecruitingRequest,
};

/// GET /api/v1/recruiting-posts
pub async fn list_posts(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ApiQuery(query): ApiQuery<RecruitingListQuery>,
) -> Result<Json<RecruitingListResponse>, AppError> {
    Ok(Json(state.recruiting.list(viewer, query).await?))
}

/// POST /api/v1/recruiting-posts
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<CreateRecruitingRequest>,
) -> Result<(StatusCode, Json<CreatedId>), AppError> {
    let created = state.recruiting.create(user_id, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/recruiting-posts/:post_id
pub async fn get_post(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ApiPath(post_id): ApiPath<Uuid>,
) -> Result<Json<RecruitingDetail>, AppError> {
    Ok(Json(state.recruiting.detail(viewer, post_id).await?))
}

/// PATCH /api/v1/recruiting-posts/:post_id
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(post_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateRecruitingRequest>,
) -> Result<Json<RecruitingDetail>, AppError> {
    Ok(Json(state.recruiting.update(user_id, post_id, body).await?))
}

/// PATCH /api/v1/recruiting-posts/:post_id/status?is_closed=
pub async fn set_post_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(post_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> Result<Json<StatusResponse>, AppError> {
    Ok(Json(
        state
            .recruiting
            .set_status(user_id, post_id, query.is_closed)
            .await?,
    ))
}

/// DELETE /api/v1/recruiting-posts/:post_id
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(post_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.recruiting.delete(user_id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
