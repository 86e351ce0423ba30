//! Reference data for client dropdowns.

use axum::{extract::State, Json};

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::models::master_data::MasterDataResponse;

/// GET /api/v1/common
pub async fn master_data(
    State(state): State<AppState>,
) -> Result<Json<MasterDataResponse>, AppError> {
    Ok(Json(state.master_data.all().await?))
}
