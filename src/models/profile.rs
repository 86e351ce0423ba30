//! Profile listing, detail and update payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::nullable;
use super::pagination::SortDirection;
use super::taxonomy::{NamedRef, PositionWithExperience};

pub const PROFILE_LIST_DEFAULT_LIMIT: i64 = 20;
pub const PROFILE_LIST_MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PositionPayload {
    pub position_id: Uuid,
    pub experience_level_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    pub is_public: Option<bool>,
    pub region_ids: Option<Vec<Uuid>>,
    pub positions: Option<Vec<PositionPayload>>,
    pub genre_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSort {
    #[default]
    Latest,
    Bookmarks,
    Views,
}

impl ProfileSort {
    /// Column expression in the profile listing query.
    pub fn column(self) -> &'static str {
        match self {
            ProfileSort::Latest => "pr.created_at",
            ProfileSort::Bookmarks => "u.bookmark_count",
            ProfileSort::Views => "pr.views_count",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileListQuery {
    pub limit: Option<i64>,
    pub cursor: Option<Uuid>,
    pub nickname: Option<String>,
    pub region_ids: Option<String>,
    pub position_ids: Option<String>,
    pub genre_ids: Option<String>,
    pub experience_level_ids: Option<String>,
    #[serde(default)]
    pub sort_by: ProfileSort,
    #[serde(default)]
    pub order_by: SortDirection,
    pub bookmarked: Option<bool>,
}

/// Parsed profile listing filters.
#[derive(Debug, Default)]
pub struct ProfileFilter {
    pub viewer_id: Option<Uuid>,
    pub nickname: Option<String>,
    pub region_ids: Option<Vec<Uuid>>,
    pub position_ids: Option<Vec<Uuid>>,
    pub genre_ids: Option<Vec<Uuid>>,
    pub experience_level_ids: Option<Vec<Uuid>>,
    pub bookmarked_only: bool,
    pub sort: ProfileSort,
    pub direction: SortDirection,
}

#[derive(Debug, Serialize)]
pub struct ProfileListItem {
    pub user_id: Uuid,
    pub nickname: String,
    pub image_url: Option<String>,
    pub is_bookmarked: bool,
    pub bookmark_count: i32,
    pub regions: Vec<NamedRef>,
    pub positions: Vec<PositionWithExperience>,
    pub genres: Vec<NamedRef>,
}

#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    pub next_cursor: Option<Uuid>,
    pub profiles: Vec<ProfileListItem>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentSummary {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub post: PostSummary,
}

#[derive(Debug, Serialize)]
pub struct ProfileDetail {
    pub user_id: Uuid,
    pub nickname: String,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub is_bookmarked: bool,
    pub bookmark_count: i32,
    pub views_count: i32,
    pub regions: Vec<NamedRef>,
    pub positions: Vec<PositionWithExperience>,
    pub genres: Vec<NamedRef>,
    pub recent_posts: Vec<PostSummary>,
    pub recent_comments: Vec<CommentSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_from_absent() {
        let absent: ProfileUpdate = serde_json::from_str(r#"{"is_public": false}"#).unwrap();
        assert!(absent.image_url.is_none());
        assert_eq!(absent.is_public, Some(false));

        let cleared: ProfileUpdate = serde_json::from_str(r#"{"image_url": null}"#).unwrap();
        assert_eq!(cleared.image_url, Some(None));

        let set: ProfileUpdate =
            serde_json::from_str(r#"{"image_url": "https://cdn/x.png"}"#).unwrap();
        assert_eq!(set.image_url, Some(Some("https://cdn/x.png".to_string())));
    }

    #[test]
    fn sort_maps_to_column() {
        assert_eq!(ProfileSort::default().column(), "pr.created_at");
        assert_eq!(ProfileSort::Bookmarks.column(), "u.bookmark_count");
        assert_eq!(ProfileSort::Views.column(), "pr.views_count");
    }

    #[test]
    fn list_query_defaults() {
        let q: ProfileListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.sort_by, ProfileSort::Latest);
        assert_eq!(q.order_by, SortDirection::Desc);
        assert!(q.bookmarked.is_none());
    }
}
