//! Users repository.

use crate::error::AppResult;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::DbPool;

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub nickname: String,
    pub is_active: bool,
    pub bookmark_count: i32,
    pub login_type: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, nickname, is_active, bookmark_count, login_type, last_login_at, created_at";

pub async fn user_create(
    pool: &DbPool,
    email: &str,
    password_hash: &str,
    nickname: &str,
    login_type: &str,
) -> AppResult<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (email, password_hash, nickname, login_type)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(email)
    .bind(password_hash)
    .bind(nickname)
    .bind(login_type)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn user_find_by_email(pool: &DbPool, email: &str) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn user_get_by_id(pool: &DbPool, id: Uuid) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Which of `email` / `nickname` are already taken, as `(email_taken, nickname_taken)`.
pub async fn user_identity_taken(
    pool: &DbPool,
    email: &str,
    nickname: &str,
) -> AppResult<(bool, bool)> {
    let taken: (bool, bool) = sqlx::query_as(
        r#"
        SELECT
            EXISTS (SELECT 1 FROM users WHERE email = $1),
            EXISTS (SELECT 1 FROM users WHERE nickname = $2)
        "#,
    )
    .bind(email)
    .bind(nickname)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

pub async fn user_touch_login(pool: &DbPool, id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE users SET last_login_at = now(), updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn user_exists(pool: &DbPool, id: Uuid) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Adjust `bookmark_count` by `delta`, never below zero.
pub async fn user_adjust_bookmark_count(
    conn: &mut PgConnection,
    id: Uuid,
    delta: i32,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE users SET bookmark_count = GREATEST(bookmark_count + $2, 0) WHERE id = $1",
    )
    .bind(id)
    .bind(delta)
    .execute(conn)
    .await?;
    Ok(())
}

/// Decrement `bookmark_count` of every user bookmarked by `user_id`.
pub async fn user_release_bookmarks_of(conn: &mut PgConnection, user_id: Uuid) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE users u
        SET bookmark_count = GREATEST(u.bookmark_count - 1, 0)
        FROM user_bookmarks b
        WHERE b.user_id = $1 AND b.bookmarked_user_id = u.id
        "#,
    )
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Decrement `bookmarks_count` of every post bookmarked by `user_id`.
pub async fn posts_release_bookmarks_of(conn: &mut PgConnection, user_id: Uuid) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE recruiting_posts p
        SET bookmarks_count = GREATEST(p.bookmarks_count - 1, 0)
        FROM post_bookmarks b
        WHERE b.user_id = $1 AND b.bookmarked_post_id = p.id AND p.user_id <> $1
        "#,
    )
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Decrement `comments_count` on other users' posts for comments written by `user_id`.
pub async fn posts_release_comments_of(conn: &mut PgConnection, user_id: Uuid) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE recruiting_posts p
        SET comments_count = GREATEST(p.comments_count - c.n, 0)
        FROM (
            SELECT post_id, COUNT(*)::int AS n
            FROM comments
            WHERE id IN (
                SELECT id FROM comments WHERE user_id = $1
                UNION
                SELECT r.id FROM comments r
                JOIN comments top ON top.id = r.parent_comment_id
                WHERE top.user_id = $1
            )
            GROUP BY post_id
        ) c
        WHERE p.id = c.post_id AND p.user_id <> $1
        "#,
    )
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn user_delete(conn: &mut PgConnection, id: Uuid) -> AppResult<bool> {
    let r = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(r.rows_affected() > 0)
}
