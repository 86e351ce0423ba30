//! Image upload endpoint.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::AuthUser;
use crate::models::image::ImageUploaded;

const FILE_FIELD: &str = "file";

/// POST /api/v1/images (multipart field `file`)
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> Result<(StatusCode, Json<ImageUploaded>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Could not read file: {}", e)))?;
        let uploaded = state
            .uploads
            .upload(content_type.as_deref(), bytes.to_vec())
            .await?;
        return Ok((StatusCode::CREATED, Json(uploaded)));
    }
    Err(AppError::BadRequest(format!(
        "Multipart field '{}' is required",
        FILE_FIELD
    )))
}
