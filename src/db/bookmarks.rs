//! User and post bookmarks.

use std::collections::HashSet;

use crate::error::AppResult;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::DbPool;

#[derive(Debug, FromRow)]
pub struct BookmarkRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Insert a user bookmark. `None` when the pair already exists.
pub async fn user_bookmark_insert(
    conn: &mut PgConnection,
    user_id: Uuid,
    target_id: Uuid,
) -> AppResult<Option<BookmarkRow>> {
    let row = sqlx::query_as::<_, BookmarkRow>(
        r#"
        INSERT INTO user_bookmarks (user_id, bookmarked_user_id)
        VALUES ($1, $2)
        ON CONFLICT ON CONSTRAINT uq_user_bookmark DO NOTHING
        RETURNING id, created_at
        "#,
    )
    .bind(user_id)
    .bind(target_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn user_bookmark_delete(
    conn: &mut PgConnection,
    user_id: Uuid,
    target_id: Uuid,
) -> AppResult<bool> {
    let r = sqlx::query("DELETE FROM user_bookmarks WHERE user_id = $1 AND bookmarked_user_id = $2")
        .bind(user_id)
        .bind(target_id)
        .execute(conn)
        .await?;
    Ok(r.rows_affected() > 0)
}

/// Insert a post bookmark. `None` when the pair already exists.
pub async fn post_bookmark_insert(
    conn: &mut PgConnection,
    user_id: Uuid,
    post_id: Uuid,
) -> AppResult<Option<BookmarkRow>> {
    let row = sqlx::query_as::<_, BookmarkRow>(
        r#"
        INSERT INTO post_bookmarks (user_id, bookmarked_post_id)
        VALUES ($1, $2)
        ON CONFLICT ON CONSTRAINT uq_post_bookmark DO NOTHING
        RETURNING id, created_at
        "#,
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn post_bookmark_delete(
    conn: &mut PgConnection,
    user_id: Uuid,
    post_id: Uuid,
) -> AppResult<bool> {
    let r = sqlx::query("DELETE FROM post_bookmarks WHERE user_id = $1 AND bookmarked_post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(conn)
        .await?;
    Ok(r.rows_affected() > 0)
}

/// Which of `user_ids` the viewer has bookmarked.
pub async fn bookmarked_users(
    pool: &DbPool,
    viewer: Uuid,
    user_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    if user_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT bookmarked_user_id FROM user_bookmarks WHERE user_id = $1 AND bookmarked_user_id = ANY($2)",
    )
    .bind(viewer)
    .bind(user_ids)
    .fetch_all(pool)
    .await?;
    Ok(ids.into_iter().collect())
}

/// Which of `post_ids` the viewer has bookmarked.
pub async fn bookmarked_posts(
    pool: &DbPool,
    viewer: Uuid,
    post_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    if post_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT bookmarked_post_id FROM post_bookmarks WHERE user_id = $1 AND bookmarked_post_id = ANY($2)",
    )
    .bind(viewer)
    .bind(post_ids)
    .fetch_all(pool)
    .await?;
    Ok(ids.into_iter().collect())
}
