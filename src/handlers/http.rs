//! Shared application state and the health probe.

use std::sync::Arc;

use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::auth::JwtSecret;
use crate::db::DbPool;
use crate::repositories::ImageStore;
use crate::services::{
    BookmarkService, CommentService, MasterDataService, ProfileService, RecruitingService,
    TokenService, UploadService, UserService,
};

/// Shared application state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub jwt_secret: JwtSecret,
    /// Mark the refresh token cookie `Secure`.
    pub cookie_secure: bool,
    pub users: UserService,
    pub tokens: TokenService,
    pub profiles: ProfileService,
    pub recruiting: RecruitingService,
    pub comments: CommentService,
    pub bookmarks: BookmarkService,
    pub uploads: UploadService,
    pub master_data: MasterDataService,
}

impl AppState {
    pub fn new(
        db: DbPool,
        jwt_secret: JwtSecret,
        image_store: Arc<dyn ImageStore>,
        max_image_bytes: usize,
        cookie_secure: bool,
    ) -> Self {
        let profiles = ProfileService::new(db.clone());
        Self {
            users: UserService::new(db.clone(), profiles.clone()),
            tokens: TokenService::new(db.clone(), jwt_secret.clone()),
            recruiting: RecruitingService::new(db.clone()),
            comments: CommentService::new(db.clone()),
            bookmarks: BookmarkService::new(db.clone()),
            uploads: UploadService::new(image_store, max_image_bytes),
            master_data: MasterDataService::new(db.clone()),
            profiles,
            db,
            jwt_secret,
            cookie_secure,
        }
    }

    pub fn db(&self) -> &DbPool {
        &self.db
    }
    pub fn jwt_secret(&self) -> &JwtSecret {
        &self.jwt_secret
    }
}

/// GET /api/v1/health (liveness).
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "bandmate" })),
    )
}
