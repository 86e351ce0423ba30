//! Bookmark endpoints for users and posts.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::{ApiPath, AuthUser};
use crate::models::bookmark::BookmarkCreated;

/// POST /api/v1/users/:user_id/bookmark
pub async fn bookmark_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(target_id): ApiPath<Uuid>,
) -> Result<(StatusCode, Json<BookmarkCreated>), AppError> {
    let created = state.bookmarks.bookmark_user(user_id, target_id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/v1/users/:user_id/bookmark
pub async fn unbookmark_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(target_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.bookmarks.unbookmark_user(user_id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/recruiting-posts/:post_id/bookmark
pub async fn bookmark_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(post_id): ApiPath<Uuid>,
) -> Result<(StatusCode, Json<BookmarkCreated>), AppError> {
    let created = state.bookmarks.bookmark_post(user_id, post_id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/v1/recruiting-posts/:post_id/bookmark
pub async fn unbookmark_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(post_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.bookmarks.unbookmark_post(user_id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
