//! Band-member recruiting backend: accounts, profiles, recruiting posts,
//! comments and bookmarks over PostgreSQL, served as a JSON REST API.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};
use handlers::{bookmarks, comments, http, master_data, profiles, recruiting, uploads, users};

/// Multipart framing on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the `/api/v1` router. Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let upload_limit = state.uploads.max_bytes() + MULTIPART_OVERHEAD;

    let api = axum::Router::new()
        .route("/health", get(http::health))
        .route("/users", post(users::register))
        .route("/users/me", get(users::me).delete(users::delete_me))
        .route("/users/me/profile", patch(users::update_profile))
        .route(
            "/users/:user_id/bookmark",
            post(bookmarks::bookmark_user).delete(bookmarks::unbookmark_user),
        )
        .route("/auth/token", post(auth::login).delete(auth::logout))
        .route("/auth/token/refresh", post(auth::refresh))
        .route("/profiles", get(profiles::list_profiles))
        .route("/profiles/:user_id", get(profiles::get_profile))
        .route(
            "/recruiting-posts",
            get(recruiting::list_posts).post(recruiting::create_post),
        )
        .route(
            "/recruiting-posts/:post_id",
            get(recruiting::get_post)
                .patch(recruiting::update_post)
                .delete(recruiting::delete_post),
        )
        .route(
            "/recruiting-posts/:post_id/status",
            patch(recruiting::set_post_status),
        )
        .route(
            "/recruiting-posts/:post_id/comments",
            post(comments::create_comment),
        )
        .route(
            "/recruiting-posts/:post_id/bookmark",
            post(bookmarks::bookmark_post).delete(bookmarks::unbookmark_post),
        )
        .route("/comments", get(comments::list_comments))
        .route(
            "/comments/:comment_id",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route(
            "/images",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/common", get(master_data::master_data));

    axum::Router::new()
        .nest("/api/v1", api)
        .with_state(state)
}
