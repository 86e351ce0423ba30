//! Recruiting posts repository.

use crate::error::AppResult;
use crate::models::profile::PostSummary;
use crate::models::recruiting::{CreateRecruitingRequest, RecruitingFilter, UpdateRecruitingRequest};
use crate::models::pagination::contains_pattern;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::DbPool;

/// A post joined with its author and single-valued references.
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub band_name: Option<String>,
    pub band_composition: Option<String>,
    pub activity_time: Option<String>,
    pub contact_info: Option<String>,
    pub application_method: Option<String>,
    pub practice_frequency_time: Option<String>,
    pub other_conditions: Option<String>,
    pub is_closed: bool,
    pub views_count: i32,
    pub comments_count: i32,
    pub bookmarks_count: i32,
    pub orientation_id: Option<Uuid>,
    pub orientation_name: Option<String>,
    pub recruitment_type_id: Option<Uuid>,
    pub recruitment_type_name: Option<String>,
    pub author_nickname: String,
    pub author_image_url: Option<String>,
}

const POST_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.created_at, p.title, p.content, p.image_url,
           p.band_name, p.band_composition, p.activity_time, p.contact_info,
           p.application_method, p.practice_frequency_time, p.other_conditions,
           p.is_closed, p.views_count, p.comments_count, p.bookmarks_count,
           p.orientation_id, o.name AS orientation_name,
           p.recruitment_type_id, rt.name AS recruitment_type_name,
           u.nickname AS author_nickname, pr.image_url AS author_image_url
    FROM recruiting_posts p
    JOIN users u ON u.id = p.user_id
    LEFT JOIN profiles pr ON pr.user_id = p.user_id
    LEFT JOIN orientations o ON o.id = p.orientation_id
    LEFT JOIN recruitment_types rt ON rt.id = p.recruitment_type_id
"#;

pub async fn post_create(
    conn: &mut PgConnection,
    user_id: Uuid,
    req: &CreateRecruitingRequest,
) -> AppResult<Uuid> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO recruiting_posts (
            user_id, title, content, image_url, band_name, band_composition,
            activity_time, contact_info, application_method,
            practice_frequency_time, other_conditions,
            orientation_id, recruitment_type_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(&req.title)
    .bind(&req.content)
    .bind(&req.image_url)
    .bind(&req.band_name)
    .bind(&req.band_composition)
    .bind(&req.activity_time)
    .bind(&req.contact_info)
    .bind(&req.application_method)
    .bind(&req.practice_frequency_time)
    .bind(&req.other_conditions)
    .bind(req.orientation_id)
    .bind(req.recruitment_type_id)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn post_get(pool: &DbPool, id: Uuid) -> AppResult<Option<PostRow>> {
    let row = sqlx::query_as::<_, PostRow>(&format!("{} WHERE p.id = $1", POST_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Owner of a post, or `None` when it does not exist.
pub async fn post_owner(pool: &DbPool, id: Uuid) -> AppResult<Option<Uuid>> {
    let owner = sqlx::query_scalar("SELECT user_id FROM recruiting_posts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(owner)
}

pub async fn post_exists(pool: &DbPool, id: Uuid) -> AppResult<bool> {
    Ok(post_owner(pool, id).await?.is_some())
}

/// Returns false when the post does not exist.
pub async fn post_increment_views(pool: &DbPool, id: Uuid) -> AppResult<bool> {
    let r = sqlx::query("UPDATE recruiting_posts SET views_count = views_count + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(r.rows_affected() > 0)
}

/// Apply the provided fields of `changes`; link lists are handled separately.
pub async fn post_update(
    conn: &mut PgConnection,
    id: Uuid,
    changes: &UpdateRecruitingRequest,
) -> AppResult<()> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE recruiting_posts SET updated_at = now()");
    if let Some(title) = &changes.title {
        qb.push(", title = ").push_bind(title.clone());
    }
    if let Some(content) = &changes.content {
        qb.push(", content = ").push_bind(content.clone());
    }
    let nullable_columns = [
        ("image_url", &changes.image_url),
        ("band_name", &changes.band_name),
        ("band_composition", &changes.band_composition),
        ("activity_time", &changes.activity_time),
        ("contact_info", &changes.contact_info),
        ("application_method", &changes.application_method),
        ("practice_frequency_time", &changes.practice_frequency_time),
        ("other_conditions", &changes.other_conditions),
    ];
    for (column, value) in nullable_columns {
        if let Some(value) = value {
            qb.push(format!(", {} = ", column)).push_bind(value.clone());
        }
    }
    if let Some(orientation_id) = changes.orientation_id {
        qb.push(", orientation_id = ").push_bind(orientation_id);
    }
    if let Some(recruitment_type_id) = changes.recruitment_type_id {
        qb.push(", recruitment_type_id = ").push_bind(recruitment_type_id);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.build().execute(conn).await?;
    Ok(())
}

pub async fn post_set_closed(pool: &DbPool, id: Uuid, is_closed: bool) -> AppResult<()> {
    sqlx::query("UPDATE recruiting_posts SET is_closed = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(is_closed)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn post_delete(pool: &DbPool, id: Uuid) -> AppResult<bool> {
    let r = sqlx::query("DELETE FROM recruiting_posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(r.rows_affected() > 0)
}

/// Adjust `comments_count` by `delta`, never below zero.
pub async fn post_adjust_comments_count(
    conn: &mut PgConnection,
    id: Uuid,
    delta: i32,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE recruiting_posts SET comments_count = GREATEST(comments_count + $2, 0) WHERE id = $1",
    )
    .bind(id)
    .bind(delta)
    .execute(conn)
    .await?;
    Ok(())
}

/// Adjust `bookmarks_count` by `delta`, never below zero.
pub async fn post_adjust_bookmarks_count(
    conn: &mut PgConnection,
    id: Uuid,
    delta: i32,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE recruiting_posts SET bookmarks_count = GREATEST(bookmarks_count + $2, 0) WHERE id = $1",
    )
    .bind(id)
    .bind(delta)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn posts_recent_by_user(
    pool: &DbPool,
    user_id: Uuid,
    limit: i64,
) -> AppResult<Vec<PostSummary>> {
    let rows = sqlx::query_as::<_, PostSummary>(
        r#"
        SELECT id, title, created_at
        FROM recruiting_posts
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// One keyset page of posts, newest/largest first. Fetches `limit + 1` rows
/// so the caller can tell whether a next page exists. `cursor` must exist.
pub async fn posts_list(
    pool: &DbPool,
    filter: &RecruitingFilter,
    cursor: Option<Uuid>,
    limit: i64,
) -> AppResult<Vec<PostRow>> {
    let sort_col = filter.sort.column();
    let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
    qb.push(" WHERE TRUE");

    if let Some(author_id) = filter.author_id {
        qb.push(" AND p.user_id = ").push_bind(author_id);
    }
    if let Some(viewer) = filter.bookmarked_by {
        qb.push(
            " AND EXISTS (SELECT 1 FROM post_bookmarks b WHERE b.bookmarked_post_id = p.id AND b.user_id = ",
        )
        .push_bind(viewer)
        .push(")");
    }
    if let Some(q) = filter.search_query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = contains_pattern(q);
        qb.push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(orientation_id) = filter.orientation_id {
        qb.push(" AND p.orientation_id = ").push_bind(orientation_id);
    }
    if let Some(level_id) = filter.experience_level_id {
        qb.push(
            " AND EXISTS (SELECT 1 FROM recruiting_post_positions x WHERE x.post_id = p.id AND x.desired_experience_level_id = ",
        )
        .push_bind(level_id)
        .push(")");
    }
    let link_filters = [
        ("recruiting_post_regions", "region_id", &filter.region_ids),
        ("recruiting_post_positions", "position_id", &filter.position_ids),
        ("recruiting_post_genres", "genre_id", &filter.genre_ids),
    ];
    for (table, column, ids) in link_filters {
        if let Some(ids) = ids.as_ref().filter(|ids| !ids.is_empty()) {
            qb.push(format!(
                " AND EXISTS (SELECT 1 FROM {} x WHERE x.post_id = p.id AND x.{} = ANY(",
                table, column
            ))
            .push_bind(ids.clone())
            .push("))");
        }
    }
    if let Some(cursor) = cursor {
        qb.push(format!(
            " AND ({col}, p.created_at, p.id) <= (SELECT {col}, p.created_at, p.id FROM recruiting_posts p WHERE p.id = ",
            col = sort_col
        ))
        .push_bind(cursor)
        .push(")");
    }
    qb.push(format!(
        " ORDER BY {} DESC, p.created_at DESC, p.id DESC LIMIT ",
        sort_col
    ))
    .push_bind(limit + 1);

    let rows = qb.build_query_as::<PostRow>().fetch_all(pool).await?;
    Ok(rows)
}
