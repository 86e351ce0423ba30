//! Recruiting posts: listing, CRUD and close/reopen.

use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, DbPool, MasterTable, NameLink, PositionLink, PostRow};
use crate::error::{AppError, AppResult};
use crate::models::pagination::{parse_uuid_list, resolve_limit, CursorPage};
use crate::models::recruiting::{
    AuthorParam, CreateRecruitingRequest, CreatedId, PositionRequest, RecruitingDetail,
    RecruitingFilter, RecruitingListQuery, RecruitingListResponse, StatusResponse,
    UpdateRecruitingRequest, RECRUITING_LIST_DEFAULT_LIMIT, RECRUITING_LIST_MAX_LIMIT,
};
use crate::models::taxonomy::{AuthorSummary, NamedRef, PositionLevel};

#[derive(Clone)]
pub struct RecruitingService {
    db: DbPool,
}

impl RecruitingService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        viewer: Option<Uuid>,
        query: RecruitingListQuery,
    ) -> AppResult<RecruitingListResponse> {
        let limit = resolve_limit(
            query.limit,
            RECRUITING_LIST_DEFAULT_LIMIT,
            RECRUITING_LIST_MAX_LIMIT,
        )?;
        let author_id = match query.author.as_deref() {
            Some(raw) => Some(AuthorParam::parse(raw)?.resolve(viewer)?),
            None => None,
        };
        let bookmarked_by = match query.bookmarks.as_deref() {
            None => None,
            Some(raw) if raw.trim().eq_ignore_ascii_case("me") => Some(
                viewer.ok_or_else(|| AppError::Auth("Authentication required".to_string()))?,
            ),
            Some(_) => {
                return Err(AppError::Validation(
                    "bookmarks only supports 'me'".to_string(),
                ))
            }
        };
        let filter = RecruitingFilter {
            author_id,
            bookmarked_by,
            search_query: query.search_query,
            orientation_id: query.orientation,
            experience_level_id: query.experienced_level,
            region_ids: parse_uuid_list(query.region_ids.as_deref())?,
            position_ids: parse_uuid_list(query.position_ids.as_deref())?,
            genre_ids: parse_uuid_list(query.genre_ids.as_deref())?,
            sort: query.sort_by,
        };
        if let Some(cursor) = query.cursor {
            if !db::post_exists(&self.db, cursor).await? {
                return Err(AppError::NotFound("Cursor not found".to_string()));
            }
        }

        let rows = db::posts_list(&self.db, &filter, query.cursor, limit).await?;
        let page = CursorPage::from_overfetch(rows, limit as usize, |r| r.id);
        let posts = self.decorate(page.items, viewer).await?;
        Ok(RecruitingListResponse {
            next_cursor: page.next_cursor,
            posts,
        })
    }

    pub async fn create(&self, user_id: Uuid, req: CreateRecruitingRequest) -> AppResult<CreatedId> {
        req.validate()?;
        let mut tx = self.db.begin().await?;
        db::ensure_refs_exist(&mut *tx, MasterTable::Orientations, &[req.orientation_id]).await?;
        db::ensure_refs_exist(
            &mut *tx,
            MasterTable::RecruitmentTypes,
            &[req.recruitment_type_id],
        )
        .await?;
        let id = db::post_create(&mut *tx, user_id, &req).await?;
        replace_links(
            &mut tx,
            id,
            req.region_ids.as_deref(),
            req.genre_ids.as_deref(),
            req.positions.as_deref(),
        )
        .await?;
        tx.commit().await?;
        info!(post_id = %id, user_id = %user_id, "recruiting post created");
        Ok(CreatedId { id })
    }

    /// Post detail; every fetch counts as a view.
    pub async fn detail(&self, viewer: Option<Uuid>, post_id: Uuid) -> AppResult<RecruitingDetail> {
        if !db::post_increment_views(&self.db, post_id).await? {
            return Err(post_not_found());
        }
        self.load_one(viewer, post_id).await
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        changes: UpdateRecruitingRequest,
    ) -> AppResult<RecruitingDetail> {
        changes.check()?;
        self.ensure_owner(user_id, post_id).await?;

        let mut tx = self.db.begin().await?;
        if let Some(orientation_id) = changes.orientation_id {
            db::ensure_refs_exist(&mut *tx, MasterTable::Orientations, &[orientation_id]).await?;
        }
        if let Some(recruitment_type_id) = changes.recruitment_type_id {
            db::ensure_refs_exist(&mut *tx, MasterTable::RecruitmentTypes, &[recruitment_type_id])
                .await?;
        }
        db::post_update(&mut *tx, post_id, &changes).await?;
        replace_links(
            &mut tx,
            post_id,
            changes.region_ids.as_deref(),
            changes.genre_ids.as_deref(),
            changes.positions.as_deref(),
        )
        .await?;
        tx.commit().await?;
        info!(post_id = %post_id, user_id = %user_id, "recruiting post updated");

        self.load_one(Some(user_id), post_id).await
    }

    pub async fn set_status(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        is_closed: bool,
    ) -> AppResult<StatusResponse> {
        self.ensure_owner(user_id, post_id).await?;
        db::post_set_closed(&self.db, post_id, is_closed).await?;
        info!(post_id = %post_id, is_closed, "recruiting post status changed");
        Ok(StatusResponse {
            id: post_id,
            is_closed,
        })
    }

    pub async fn delete(&self, user_id: Uuid, post_id: Uuid) -> AppResult<()> {
        self.ensure_owner(user_id, post_id).await?;
        db::post_delete(&self.db, post_id).await?;
        info!(post_id = %post_id, user_id = %user_id, "recruiting post deleted");
        Ok(())
    }

    async fn ensure_owner(&self, user_id: Uuid, post_id: Uuid) -> AppResult<()> {
        let owner = db::post_owner(&self.db, post_id)
            .await?
            .ok_or_else(post_not_found)?;
        if owner != user_id {
            return Err(AppError::Forbidden(
                "Only the author can modify this post".to_string(),
            ));
        }
        Ok(())
    }

    async fn load_one(&self, viewer: Option<Uuid>, post_id: Uuid) -> AppResult<RecruitingDetail> {
        let row = db::post_get(&self.db, post_id)
            .await?
            .ok_or_else(post_not_found)?;
        self.decorate(vec![row], viewer)
            .await?
            .pop()
            .ok_or_else(post_not_found)
    }

    /// Attach taxonomy names and viewer flags to a batch of posts.
    async fn decorate(
        &self,
        rows: Vec<PostRow>,
        viewer: Option<Uuid>,
    ) -> AppResult<Vec<RecruitingDetail>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut regions = db::group_by_owner::<_, NamedRef>(
            db::name_links_load(&self.db, NameLink::PostRegions, &ids).await?,
            |r| r.owner_id,
        );
        let mut genres = db::group_by_owner::<_, NamedRef>(
            db::name_links_load(&self.db, NameLink::PostGenres, &ids).await?,
            |r| r.owner_id,
        );
        let mut positions = db::group_by_owner::<_, PositionLevel>(
            db::position_links_load(&self.db, PositionLink::Post, &ids).await?,
            |r| r.owner_id,
        );
        let bookmarked = match viewer {
            Some(v) => db::bookmarked_posts(&self.db, v, &ids).await?,
            None => HashSet::new(),
        };

        Ok(rows
            .into_iter()
            .map(|row| RecruitingDetail {
                id: row.id,
                created_at: row.created_at,
                author: AuthorSummary {
                    user_id: row.user_id,
                    nickname: row.author_nickname,
                    image_url: row.author_image_url,
                },
                title: row.title,
                content: row.content,
                image_url: row.image_url,
                band_name: row.band_name,
                band_composition: row.band_composition,
                activity_time: row.activity_time,
                contact_info: row.contact_info,
                application_method: row.application_method,
                practice_frequency_time: row.practice_frequency_time,
                other_conditions: row.other_conditions,
                is_closed: row.is_closed,
                is_owner: viewer == Some(row.user_id),
                is_bookmarked: bookmarked.contains(&row.id),
                views_count: row.views_count,
                comments_count: row.comments_count,
                bookmarks_count: row.bookmarks_count,
                orientation: named(row.orientation_id, row.orientation_name),
                recruitment_type: named(row.recruitment_type_id, row.recruitment_type_name),
                regions: regions.remove(&row.id).unwrap_or_default(),
                genres: genres.remove(&row.id).unwrap_or_default(),
                positions: positions.remove(&row.id).unwrap_or_default(),
            })
            .collect())
    }
}

async fn replace_links(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    post_id: Uuid,
    region_ids: Option<&[Uuid]>,
    genre_ids: Option<&[Uuid]>,
    positions: Option<&[PositionRequest]>,
) -> AppResult<()> {
    if let Some(region_ids) = region_ids {
        db::name_links_replace(&mut **tx, NameLink::PostRegions, post_id, region_ids).await?;
    }
    if let Some(genre_ids) = genre_ids {
        db::name_links_replace(&mut **tx, NameLink::PostGenres, post_id, genre_ids).await?;
    }
    if let Some(positions) = positions {
        let pairs: Vec<(Uuid, Uuid)> = positions
            .iter()
            .map(|p| (p.position_id, p.experienced_level_id))
            .collect();
        db::position_links_replace(&mut **tx, PositionLink::Post, post_id, &pairs).await?;
    }
    Ok(())
}

fn named(id: Option<Uuid>, name: Option<String>) -> Option<NamedRef> {
    Some(NamedRef { id: id?, name: name? })
}

fn post_not_found() -> AppError {
    AppError::NotFound("Recruiting post not found".to_string())
}
