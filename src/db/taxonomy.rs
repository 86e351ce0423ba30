//! Reference tables and the link tables that attach them to posts and profiles.
//!
//! Table and column names below come from closed enums, never from input, so
//! they are safe to splice into SQL text.

use crate::error::{AppError, AppResult};
use crate::models::taxonomy::{NamedRef, OwnedNamedRef, OwnedPosition};
use sqlx::PgConnection;
use uuid::Uuid;

use super::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterTable {
    Regions,
    Positions,
    Genres,
    ExperienceLevels,
    Orientations,
    RecruitmentTypes,
}

impl MasterTable {
    pub fn table(self) -> &'static str {
        match self {
            MasterTable::Regions => "regions",
            MasterTable::Positions => "positions",
            MasterTable::Genres => "genres",
            MasterTable::ExperienceLevels => "experience_levels",
            MasterTable::Orientations => "orientations",
            MasterTable::RecruitmentTypes => "recruitment_types",
        }
    }

    fn label(self) -> &'static str {
        match self {
            MasterTable::Regions => "region",
            MasterTable::Positions => "position",
            MasterTable::Genres => "genre",
            MasterTable::ExperienceLevels => "experience level",
            MasterTable::Orientations => "orientation",
            MasterTable::RecruitmentTypes => "recruitment type",
        }
    }
}

/// Many-to-many links with no extra payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLink {
    PostRegions,
    PostGenres,
    ProfileRegions,
    ProfileGenres,
}

impl NameLink {
    /// (link table, owner column, reference column, reference table)
    fn parts(self) -> (&'static str, &'static str, &'static str, MasterTable) {
        match self {
            NameLink::PostRegions => (
                "recruiting_post_regions",
                "post_id",
                "region_id",
                MasterTable::Regions,
            ),
            NameLink::PostGenres => (
                "recruiting_post_genres",
                "post_id",
                "genre_id",
                MasterTable::Genres,
            ),
            NameLink::ProfileRegions => (
                "profile_regions",
                "profile_id",
                "region_id",
                MasterTable::Regions,
            ),
            NameLink::ProfileGenres => (
                "profile_genres",
                "profile_id",
                "genre_id",
                MasterTable::Genres,
            ),
        }
    }
}

/// Position links carry an experience level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionLink {
    Post,
    Profile,
}

impl PositionLink {
    /// (link table, owner column, level column)
    fn parts(self) -> (&'static str, &'static str, &'static str) {
        match self {
            PositionLink::Post => (
                "recruiting_post_positions",
                "post_id",
                "desired_experience_level_id",
            ),
            PositionLink::Profile => ("profile_positions", "profile_id", "experience_level_id"),
        }
    }
}

/// All rows of a reference table in display order.
pub async fn master_list(pool: &DbPool, table: MasterTable) -> AppResult<Vec<NamedRef>> {
    let rows = sqlx::query_as::<_, NamedRef>(&format!(
        "SELECT id, name FROM {} ORDER BY display_order, name",
        table.table()
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fail with 400 unless every id exists in `table`.
pub async fn ensure_refs_exist(
    conn: &mut PgConnection,
    table: MasterTable,
    ids: &[Uuid],
) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();
    let found: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE id = ANY($1)",
        table.table()
    ))
    .bind(&unique)
    .fetch_one(conn)
    .await?;
    if found != unique.len() as i64 {
        return Err(AppError::BadRequest(format!(
            "Unknown {} id",
            table.label()
        )));
    }
    Ok(())
}

/// Replace the links of `owner_id` with `ids`.
pub async fn name_links_replace(
    conn: &mut PgConnection,
    link: NameLink,
    owner_id: Uuid,
    ids: &[Uuid],
) -> AppResult<()> {
    let (table, owner_col, ref_col, master) = link.parts();
    ensure_refs_exist(&mut *conn, master, ids).await?;
    sqlx::query(&format!("DELETE FROM {} WHERE {} = $1", table, owner_col))
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query(&format!(
        "INSERT INTO {} ({}, {}) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
        table, owner_col, ref_col
    ))
    .bind(owner_id)
    .bind(ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Replace the position links of `owner_id` with `(position_id, level_id)` pairs.
/// A repeated position keeps its first level.
pub async fn position_links_replace(
    conn: &mut PgConnection,
    link: PositionLink,
    owner_id: Uuid,
    pairs: &[(Uuid, Uuid)],
) -> AppResult<()> {
    let (table, owner_col, level_col) = link.parts();
    let positions: Vec<Uuid> = pairs.iter().map(|p| p.0).collect();
    let levels: Vec<Uuid> = pairs.iter().map(|p| p.1).collect();
    ensure_refs_exist(&mut *conn, MasterTable::Positions, &positions).await?;
    ensure_refs_exist(&mut *conn, MasterTable::ExperienceLevels, &levels).await?;
    sqlx::query(&format!("DELETE FROM {} WHERE {} = $1", table, owner_col))
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;
    if pairs.is_empty() {
        return Ok(());
    }
    sqlx::query(&format!(
        r#"
        INSERT INTO {} ({}, position_id, {})
        SELECT $1, t.position_id, t.level_id
        FROM UNNEST($2::uuid[], $3::uuid[]) AS t(position_id, level_id)
        ON CONFLICT DO NOTHING
        "#,
        table, owner_col, level_col
    ))
    .bind(owner_id)
    .bind(&positions)
    .bind(&levels)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Linked names for a batch of owners, in display order.
pub async fn name_links_load(
    pool: &DbPool,
    link: NameLink,
    owner_ids: &[Uuid],
) -> AppResult<Vec<OwnedNamedRef>> {
    if owner_ids.is_empty() {
        return Ok(Vec::new());
    }
    let (table, owner_col, ref_col, master) = link.parts();
    let rows = sqlx::query_as::<_, OwnedNamedRef>(&format!(
        r#"
        SELECT l.{owner} AS owner_id, r.id, r.name
        FROM {table} l
        JOIN {master} r ON r.id = l.{refcol}
        WHERE l.{owner} = ANY($1)
        ORDER BY r.display_order, r.name
        "#,
        owner = owner_col,
        table = table,
        master = master.table(),
        refcol = ref_col,
    ))
    .bind(owner_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Linked positions with level names for a batch of owners.
pub async fn position_links_load(
    pool: &DbPool,
    link: PositionLink,
    owner_ids: &[Uuid],
) -> AppResult<Vec<OwnedPosition>> {
    if owner_ids.is_empty() {
        return Ok(Vec::new());
    }
    let (table, owner_col, level_col) = link.parts();
    let rows = sqlx::query_as::<_, OwnedPosition>(&format!(
        r#"
        SELECT l.{owner} AS owner_id,
               p.id AS position_id, p.name AS position_name,
               e.id AS level_id, e.name AS level_name
        FROM {table} l
        JOIN positions p ON p.id = l.position_id
        JOIN experience_levels e ON e.id = l.{level}
        WHERE l.{owner} = ANY($1)
        ORDER BY p.display_order, p.name
        "#,
        owner = owner_col,
        table = table,
        level = level_col,
    ))
    .bind(owner_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Group owner-keyed rows into per-owner vectors, preserving row order.
pub fn group_by_owner<R, T>(
    rows: Vec<R>,
    owner_of: impl Fn(&R) -> Uuid,
) -> std::collections::HashMap<Uuid, Vec<T>>
where
    T: From<R>,
{
    let mut map: std::collections::HashMap<Uuid, Vec<T>> = std::collections::HashMap::new();
    for row in rows {
        map.entry(owner_of(&row)).or_default().push(T::from(row));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::taxonomy::PositionLevel;

    #[test]
    fn group_by_owner_keeps_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let rows = vec![
            OwnedNamedRef { owner_id: a, id: Uuid::new_v4(), name: "서울".into() },
            OwnedNamedRef { owner_id: b, id: Uuid::new_v4(), name: "부산".into() },
            OwnedNamedRef { owner_id: a, id: Uuid::new_v4(), name: "경기".into() },
        ];
        let grouped: std::collections::HashMap<Uuid, Vec<NamedRef>> =
            group_by_owner(rows, |r| r.owner_id);
        let names: Vec<_> = grouped[&a].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["서울", "경기"]);
        assert_eq!(grouped[&b].len(), 1);
    }

    #[test]
    fn position_rows_convert_to_flat_levels() {
        let owner = Uuid::new_v4();
        let rows = vec![OwnedPosition {
            owner_id: owner,
            position_id: Uuid::new_v4(),
            position_name: "드럼".into(),
            level_id: Uuid::new_v4(),
            level_name: "1년 이하".into(),
        }];
        let grouped: std::collections::HashMap<Uuid, Vec<PositionLevel>> =
            group_by_owner(rows, |r| r.owner_id);
        assert_eq!(grouped[&owner][0].position_name, "드럼");
        assert_eq!(grouped[&owner][0].experienced_level_name, "1년 이하");
    }

    #[test]
    fn link_tables_are_fixed() {
        assert_eq!(NameLink::PostRegions.parts().0, "recruiting_post_regions");
        assert_eq!(PositionLink::Profile.parts().2, "experience_level_id");
        assert_eq!(MasterTable::RecruitmentTypes.table(), "recruitment_types");
    }
}
