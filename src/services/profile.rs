//! Profile listing, detail and update.

use std::collections::{HashMap, HashSet};

use tracing::info;
use uuid::Uuid;

use crate::db::{self, CommentRow, DbPool, NameLink, PositionLink, ProfileRow};
use crate::error::{AppError, AppResult};
use crate::models::pagination::{parse_uuid_list, resolve_limit, CursorPage};
use crate::models::profile::{
    CommentSummary, PostSummary, ProfileDetail, ProfileFilter, ProfileListItem,
    ProfileListQuery, ProfileListResponse, ProfileUpdate, PROFILE_LIST_DEFAULT_LIMIT,
    PROFILE_LIST_MAX_LIMIT,
};
use crate::models::taxonomy::{NamedRef, PositionWithExperience};

const RECENT_ACTIVITY_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct ProfileService {
    db: DbPool,
}

/// Link names for a batch of profiles, keyed by profile id.
struct ProfileLinks {
    regions: HashMap<Uuid, Vec<NamedRef>>,
    genres: HashMap<Uuid, Vec<NamedRef>>,
    positions: HashMap<Uuid, Vec<PositionWithExperience>>,
}

impl ProfileLinks {
    fn take(&mut self, profile_id: Uuid) -> (Vec<NamedRef>, Vec<PositionWithExperience>, Vec<NamedRef>) {
        (
            self.regions.remove(&profile_id).unwrap_or_default(),
            self.positions.remove(&profile_id).unwrap_or_default(),
            self.genres.remove(&profile_id).unwrap_or_default(),
        )
    }
}

impl ProfileService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        viewer: Option<Uuid>,
        query: ProfileListQuery,
    ) -> AppResult<ProfileListResponse> {
        let limit = resolve_limit(query.limit, PROFILE_LIST_DEFAULT_LIMIT, PROFILE_LIST_MAX_LIMIT)?;
        let bookmarked_only = query.bookmarked.unwrap_or(false);
        if bookmarked_only && viewer.is_none() {
            return Err(AppError::Auth("Authentication required".to_string()));
        }
        let filter = ProfileFilter {
            viewer_id: viewer,
            nickname: query.nickname,
            region_ids: parse_uuid_list(query.region_ids.as_deref())?,
            position_ids: parse_uuid_list(query.position_ids.as_deref())?,
            genre_ids: parse_uuid_list(query.genre_ids.as_deref())?,
            experience_level_ids: parse_uuid_list(query.experience_level_ids.as_deref())?,
            bookmarked_only,
            sort: query.sort_by,
            direction: query.order_by,
        };
        if let Some(cursor) = query.cursor {
            if db::profile_get_by_user(&self.db, cursor).await?.is_none() {
                return Err(AppError::NotFound("Cursor not found".to_string()));
            }
        }

        let rows = db::profiles_list(&self.db, &filter, query.cursor, limit).await?;
        let page = CursorPage::from_overfetch(rows, limit as usize, |r| r.user_id);

        let profile_ids: Vec<Uuid> = page.items.iter().map(|r| r.profile_id).collect();
        let user_ids: Vec<Uuid> = page.items.iter().map(|r| r.user_id).collect();
        let mut links = self.load_links(&profile_ids).await?;
        let bookmarked = match viewer {
            Some(v) => db::bookmarked_users(&self.db, v, &user_ids).await?,
            None => HashSet::new(),
        };

        let page = page.map(|row| {
            let (regions, positions, genres) = links.take(row.profile_id);
            ProfileListItem {
                user_id: row.user_id,
                nickname: row.nickname,
                image_url: row.image_url,
                is_bookmarked: bookmarked.contains(&row.user_id),
                bookmark_count: row.bookmark_count,
                regions,
                positions,
                genres,
            }
        });
        Ok(ProfileListResponse {
            next_cursor: page.next_cursor,
            profiles: page.items,
        })
    }

    /// Someone's profile. Private profiles are visible to their owner only;
    /// views by anyone else are counted.
    pub async fn detail(&self, viewer: Option<Uuid>, user_id: Uuid) -> AppResult<ProfileDetail> {
        let mut row = db::profile_get_by_user(&self.db, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
        let is_owner = viewer == Some(user_id);
        if !row.is_public && !is_owner {
            return Err(AppError::Forbidden("This profile is private".to_string()));
        }
        if !is_owner {
            db::profile_increment_views(&self.db, row.profile_id).await?;
            row.views_count += 1;
        }
        self.assemble(row, viewer).await
    }

    /// The caller's own profile, if they have one.
    pub async fn own(&self, user_id: Uuid) -> AppResult<Option<ProfileDetail>> {
        match db::profile_get_by_user(&self.db, user_id).await? {
            Some(row) => Ok(Some(self.assemble(row, Some(user_id)).await?)),
            None => Ok(None),
        }
    }

    /// Create-or-update the caller's profile. Provided link lists replace the
    /// existing ones.
    pub async fn update(&self, user_id: Uuid, changes: ProfileUpdate) -> AppResult<ProfileDetail> {
        let mut tx = self.db.begin().await?;
        let profile_id = db::profile_ensure(&mut *tx, user_id).await?;
        db::profile_update(&mut *tx, profile_id, changes.image_url, changes.is_public).await?;
        if let Some(region_ids) = &changes.region_ids {
            db::name_links_replace(&mut *tx, NameLink::ProfileRegions, profile_id, region_ids).await?;
        }
        if let Some(genre_ids) = &changes.genre_ids {
            db::name_links_replace(&mut *tx, NameLink::ProfileGenres, profile_id, genre_ids).await?;
        }
        if let Some(positions) = &changes.positions {
            let pairs: Vec<(Uuid, Uuid)> = positions
                .iter()
                .map(|p| (p.position_id, p.experience_level_id))
                .collect();
            db::position_links_replace(&mut *tx, PositionLink::Profile, profile_id, &pairs).await?;
        }
        tx.commit().await?;
        info!(user_id = %user_id, profile_id = %profile_id, "profile updated");

        self.own(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    async fn load_links(&self, profile_ids: &[Uuid]) -> AppResult<ProfileLinks> {
        let regions = db::name_links_load(&self.db, NameLink::ProfileRegions, profile_ids).await?;
        let genres = db::name_links_load(&self.db, NameLink::ProfileGenres, profile_ids).await?;
        let positions =
            db::position_links_load(&self.db, PositionLink::Profile, profile_ids).await?;
        Ok(ProfileLinks {
            regions: db::group_by_owner(regions, |r| r.owner_id),
            genres: db::group_by_owner(genres, |r| r.owner_id),
            positions: db::group_by_owner(positions, |r| r.owner_id),
        })
    }

    async fn assemble(&self, row: ProfileRow, viewer: Option<Uuid>) -> AppResult<ProfileDetail> {
        let mut links = self.load_links(&[row.profile_id]).await?;
        let (regions, positions, genres) = links.take(row.profile_id);
        let is_bookmarked = match viewer {
            Some(v) if v != row.user_id => db::bookmarked_users(&self.db, v, &[row.user_id])
                .await?
                .contains(&row.user_id),
            _ => false,
        };
        let recent_posts =
            db::posts_recent_by_user(&self.db, row.user_id, RECENT_ACTIVITY_LIMIT).await?;
        let recent_comments =
            db::comments_recent_by_user(&self.db, row.user_id, RECENT_ACTIVITY_LIMIT)
                .await?
                .into_iter()
                .map(comment_summary)
                .collect();

        Ok(ProfileDetail {
            user_id: row.user_id,
            nickname: row.nickname,
            image_url: row.image_url,
            is_public: row.is_public,
            is_bookmarked,
            bookmark_count: row.bookmark_count,
            views_count: row.views_count,
            regions,
            positions,
            genres,
            recent_posts,
            recent_comments,
        })
    }
}

fn comment_summary(row: CommentRow) -> CommentSummary {
    CommentSummary {
        id: row.id,
        content: row.content,
        created_at: row.created_at,
        post: PostSummary {
            id: row.post_id,
            title: row.post_title,
            created_at: row.post_created_at,
        },
    }
}
