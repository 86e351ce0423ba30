//! Profiles repository.

use crate::error::AppResult;
use crate::models::pagination::contains_pattern;
use crate::models::profile::ProfileFilter;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::DbPool;

/// A profile joined with its user's nickname and bookmark count.
#[derive(Debug, FromRow)]
pub struct ProfileRow {
    pub profile_id: Uuid,
    pub user_id: Uuid,
    pub nickname: String,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub views_count: i32,
    pub bookmark_count: i32,
    pub created_at: DateTime<Utc>,
}

const PROFILE_SELECT: &str = r#"
    SELECT pr.id AS profile_id, pr.user_id, u.nickname, pr.image_url, pr.is_public,
           pr.views_count, u.bookmark_count, pr.created_at
    FROM profiles pr
    JOIN users u ON u.id = pr.user_id
"#;

pub async fn profile_get_by_user(pool: &DbPool, user_id: Uuid) -> AppResult<Option<ProfileRow>> {
    let row = sqlx::query_as::<_, ProfileRow>(&format!("{} WHERE pr.user_id = $1", PROFILE_SELECT))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Profile id of `user_id`, creating an empty public profile when missing.
pub async fn profile_ensure(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Uuid> {
    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    let id = sqlx::query_scalar("SELECT id FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

pub async fn profile_update(
    conn: &mut PgConnection,
    profile_id: Uuid,
    image_url: Option<Option<String>>,
    is_public: Option<bool>,
) -> AppResult<()> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE profiles SET updated_at = now()");
    if let Some(image_url) = image_url {
        qb.push(", image_url = ").push_bind(image_url);
    }
    if let Some(is_public) = is_public {
        qb.push(", is_public = ").push_bind(is_public);
    }
    qb.push(" WHERE id = ").push_bind(profile_id);
    qb.build().execute(conn).await?;
    Ok(())
}

pub async fn profile_increment_views(pool: &DbPool, profile_id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE profiles SET views_count = views_count + 1 WHERE id = $1")
        .bind(profile_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// One keyset page of profiles keyed by `user_id`. Fetches `limit + 1` rows.
/// `cursor` must name an existing profile.
pub async fn profiles_list(
    pool: &DbPool,
    filter: &ProfileFilter,
    cursor: Option<Uuid>,
    limit: i64,
) -> AppResult<Vec<ProfileRow>> {
    let sort_col = filter.sort.column();
    let dir = filter.direction;
    let mut qb = QueryBuilder::<Postgres>::new(PROFILE_SELECT);
    qb.push(" WHERE u.is_active");

    match filter.viewer_id {
        Some(viewer) => {
            qb.push(" AND (pr.is_public OR pr.user_id = ")
                .push_bind(viewer)
                .push(")");
            if filter.bookmarked_only {
                qb.push(
                    " AND EXISTS (SELECT 1 FROM user_bookmarks b WHERE b.bookmarked_user_id = pr.user_id AND b.user_id = ",
                )
                .push_bind(viewer)
                .push(")");
            }
        }
        None => {
            qb.push(" AND pr.is_public");
        }
    }
    if let Some(nickname) = filter.nickname.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        qb.push(" AND u.nickname ILIKE ").push_bind(contains_pattern(nickname));
    }
    let link_filters = [
        ("profile_regions", "region_id", &filter.region_ids),
        ("profile_positions", "position_id", &filter.position_ids),
        ("profile_genres", "genre_id", &filter.genre_ids),
        ("profile_positions", "experience_level_id", &filter.experience_level_ids),
    ];
    for (table, column, ids) in link_filters {
        if let Some(ids) = ids.as_ref().filter(|ids| !ids.is_empty()) {
            qb.push(format!(
                " AND EXISTS (SELECT 1 FROM {} x WHERE x.profile_id = pr.id AND x.{} = ANY(",
                table, column
            ))
            .push_bind(ids.clone())
            .push("))");
        }
    }
    if let Some(cursor) = cursor {
        qb.push(format!(
            " AND ({col}, pr.created_at, pr.user_id) {op} (SELECT {col}, pr.created_at, pr.user_id FROM profiles pr JOIN users u ON u.id = pr.user_id WHERE pr.user_id = ",
            col = sort_col,
            op = dir.inclusive_op(),
        ))
        .push_bind(cursor)
        .push(")");
    }
    qb.push(format!(
        " ORDER BY {col} {d}, pr.created_at {d}, pr.user_id {d} LIMIT ",
        col = sort_col,
        d = dir.keyword(),
    ))
    .push_bind(limit + 1);

    let rows = qb.build_query_as::<ProfileRow>().fetch_all(pool).await?;
    Ok(rows)
}
