//! Comments repository.

use crate::error::AppResult;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::DbPool;

/// A comment joined with its post title and author.
#[derive(Debug, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub post_title: String,
    pub post_created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_nickname: String,
    pub author_image_url: Option<String>,
}

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, p.title AS post_title, p.created_at AS post_created_at,
           c.user_id, c.parent_comment_id, c.content, c.created_at,
           u.nickname AS author_nickname, pr.image_url AS author_image_url
    FROM comments c
    JOIN recruiting_posts p ON p.id = c.post_id
    JOIN users u ON u.id = c.user_id
    LEFT JOIN profiles pr ON pr.user_id = c.user_id
"#;

pub async fn comment_get(pool: &DbPool, id: Uuid) -> AppResult<Option<CommentRow>> {
    let row = sqlx::query_as::<_, CommentRow>(&format!("{} WHERE c.id = $1", COMMENT_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn comment_create(
    conn: &mut PgConnection,
    post_id: Uuid,
    user_id: Uuid,
    parent_comment_id: Option<Uuid>,
    content: &str,
) -> AppResult<Uuid> {
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO comments (post_id, user_id, parent_comment_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(parent_comment_id)
    .bind(content)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn comment_update_content(pool: &DbPool, id: Uuid, content: &str) -> AppResult<()> {
    sqlx::query("UPDATE comments SET content = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(content)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a comment and (by cascade) its replies. Returns how many rows went.
pub async fn comment_delete(conn: &mut PgConnection, id: Uuid) -> AppResult<i64> {
    let replies: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE parent_comment_id = $1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    let r = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if r.rows_affected() == 0 {
        return Ok(0);
    }
    Ok(1 + replies)
}

/// Top-level comments of a post, newest first, `limit + 1` rows.
pub async fn comments_top_level_page(
    pool: &DbPool,
    post_id: Uuid,
    cursor: Option<Uuid>,
    limit: i64,
) -> AppResult<Vec<CommentRow>> {
    let mut qb = QueryBuilder::<Postgres>::new(COMMENT_SELECT);
    qb.push(" WHERE c.post_id = ")
        .push_bind(post_id)
        .push(" AND c.parent_comment_id IS NULL");
    push_cursor(&mut qb, cursor);
    qb.push(" ORDER BY c.created_at DESC, c.id DESC LIMIT ")
        .push_bind(limit + 1);
    let rows = qb.build_query_as::<CommentRow>().fetch_all(pool).await?;
    Ok(rows)
}

/// Every comment written by `user_id`, newest first, `limit + 1` rows.
pub async fn comments_by_author_page(
    pool: &DbPool,
    user_id: Uuid,
    cursor: Option<Uuid>,
    limit: i64,
) -> AppResult<Vec<CommentRow>> {
    let mut qb = QueryBuilder::<Postgres>::new(COMMENT_SELECT);
    qb.push(" WHERE c.user_id = ").push_bind(user_id);
    push_cursor(&mut qb, cursor);
    qb.push(" ORDER BY c.created_at DESC, c.id DESC LIMIT ")
        .push_bind(limit + 1);
    let rows = qb.build_query_as::<CommentRow>().fetch_all(pool).await?;
    Ok(rows)
}

fn push_cursor(qb: &mut QueryBuilder<'_, Postgres>, cursor: Option<Uuid>) {
    if let Some(cursor) = cursor {
        qb.push(" AND (c.created_at, c.id) <= (SELECT c.created_at, c.id FROM comments c WHERE c.id = ")
            .push_bind(cursor)
            .push(")");
    }
}

/// Replies to any of `parent_ids`, oldest first.
pub async fn comments_replies_of(pool: &DbPool, parent_ids: &[Uuid]) -> AppResult<Vec<CommentRow>> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        "{} WHERE c.parent_comment_id = ANY($1) ORDER BY c.created_at ASC, c.id ASC",
        COMMENT_SELECT
    ))
    .bind(parent_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn comments_recent_by_user(
    pool: &DbPool,
    user_id: Uuid,
    limit: i64,
) -> AppResult<Vec<CommentRow>> {
    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        "{} WHERE c.user_id = $1 ORDER BY c.created_at DESC, c.id DESC LIMIT $2",
        COMMENT_SELECT
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
