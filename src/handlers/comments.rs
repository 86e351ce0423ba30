//! Comment endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, AuthUser, MaybeAuthUser};
use crate::models::comment::{
    CommentItem, CommentListQuery, CommentListResponse, CreateCommentRequest,
    UpdateCommentRequest,
};
use crate::models::recruiting::CreatedId;

/// POST /api/v1/recruiting-posts/:post_id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(post_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CreatedId>), AppError> {
    let created = state.comments.create(user_id, post_id, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/comments?post_id=|author=
pub async fn list_comments(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ApiQuery(query): ApiQuery<CommentListQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    Ok(Json(state.comments.list(viewer, query).await?))
}

/// PATCH /api/v1/comments/:comment_id
pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(comment_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateCommentRequest>,
) -> Result<Json<CommentItem>, AppError> {
    Ok(Json(state.comments.update(user_id, comment_id, body).await?))
}

/// DELETE /api/v1/comments/:comment_id
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(comment_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.comments.delete(user_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
