//! Recruiting post payloads, listing filters and sort keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::nullable;
use super::taxonomy::{AuthorSummary, NamedRef, PositionLevel};
use crate::error::{AppError, AppResult};

pub const RECRUITING_LIST_DEFAULT_LIMIT: i64 = 10;
pub const RECRUITING_LIST_MAX_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PositionRequest {
    pub position_id: Uuid,
    pub experienced_level_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecruitingRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    pub image_url: Option<String>,
    #[validate(length(max = 100))]
    pub band_name: Option<String>,
    pub band_composition: Option<String>,
    #[validate(length(max = 100))]
    pub activity_time: Option<String>,
    #[validate(length(max = 255))]
    pub contact_info: Option<String>,
    pub application_method: Option<String>,
    #[validate(length(max = 100))]
    pub practice_frequency_time: Option<String>,
    pub other_conditions: Option<String>,
    pub orientation_id: Uuid,
    pub recruitment_type_id: Uuid,
    pub region_ids: Option<Vec<Uuid>>,
    pub genre_ids: Option<Vec<Uuid>>,
    pub positions: Option<Vec<PositionRequest>>,
}

/// Partial update. Outer `None` leaves the column alone; for the optional text
/// columns `Some(None)` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecruitingRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub band_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub band_composition: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub activity_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_info: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub application_method: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub practice_frequency_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub other_conditions: Option<Option<String>>,
    pub orientation_id: Option<Uuid>,
    pub recruitment_type_id: Option<Uuid>,
    pub region_ids: Option<Vec<Uuid>>,
    pub genre_ids: Option<Vec<Uuid>>,
    pub positions: Option<Vec<PositionRequest>>,
}

impl UpdateRecruitingRequest {
    pub fn check(&self) -> AppResult<()> {
        if let Some(title) = &self.title {
            let len = title.chars().count();
            if len == 0 || len > 255 {
                return Err(AppError::Validation("title must be 1-255 characters".into()));
            }
        }
        if matches!(&self.content, Some(c) if c.is_empty()) {
            return Err(AppError::Validation("content must not be empty".into()));
        }
        let bounded = [
            (&self.band_name, 100, "band_name"),
            (&self.activity_time, 100, "activity_time"),
            (&self.contact_info, 255, "contact_info"),
            (&self.practice_frequency_time, 100, "practice_frequency_time"),
        ];
        for (value, max, field) in bounded {
            if let Some(Some(v)) = value {
                if v.chars().count() > max {
                    return Err(AppError::Validation(format!(
                        "{} must be at most {} characters",
                        field, max
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecruitingSort {
    #[default]
    Latest,
    Comments,
    Views,
    Bookmark,
}

impl RecruitingSort {
    pub fn column(self) -> &'static str {
        match self {
            RecruitingSort::Latest => "p.created_at",
            RecruitingSort::Comments => "p.comments_count",
            RecruitingSort::Views => "p.views_count",
            RecruitingSort::Bookmark => "p.bookmarks_count",
        }
    }
}

/// `author` query value: the caller (`me`) or a specific user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorParam {
    Me,
    User(Uuid),
}

impl AuthorParam {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("me") {
            return Ok(AuthorParam::Me);
        }
        Uuid::parse_str(raw)
            .map(AuthorParam::User)
            .map_err(|_| AppError::Validation("author must be 'me' or a user id".into()))
    }

    /// Resolve against the caller; `me` needs an authenticated caller.
    pub fn resolve(self, viewer: Option<Uuid>) -> AppResult<Uuid> {
        match self {
            AuthorParam::User(id) => Ok(id),
            AuthorParam::Me => {
                viewer.ok_or_else(|| AppError::Auth("Authentication required".into()))
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecruitingListQuery {
    pub limit: Option<i64>,
    pub cursor: Option<Uuid>,
    pub author: Option<String>,
    pub bookmarks: Option<String>,
    pub search_query: Option<String>,
    pub orientation: Option<Uuid>,
    pub experienced_level: Option<Uuid>,
    pub region_ids: Option<String>,
    pub position_ids: Option<String>,
    pub genre_ids: Option<String>,
    #[serde(default)]
    pub sort_by: RecruitingSort,
}

/// Parsed recruiting listing filters.
#[derive(Debug, Default)]
pub struct RecruitingFilter {
    pub author_id: Option<Uuid>,
    pub bookmarked_by: Option<Uuid>,
    pub search_query: Option<String>,
    pub orientation_id: Option<Uuid>,
    pub experience_level_id: Option<Uuid>,
    pub region_ids: Option<Vec<Uuid>>,
    pub position_ids: Option<Vec<Uuid>>,
    pub genre_ids: Option<Vec<Uuid>>,
    pub sort: RecruitingSort,
}

#[derive(Debug, Serialize)]
pub struct RecruitingDetail {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
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
    pub is_owner: bool,
    pub is_bookmarked: bool,
    pub views_count: i32,
    pub comments_count: i32,
    pub bookmarks_count: i32,
    pub orientation: Option<NamedRef>,
    pub recruitment_type: Option<NamedRef>,
    pub regions: Vec<NamedRef>,
    pub genres: Vec<NamedRef>,
    pub positions: Vec<PositionLevel>,
}

#[derive(Debug, Serialize)]
pub struct RecruitingListResponse {
    pub next_cursor: Option<Uuid>,
    pub posts: Vec<RecruitingDetail>,
}

#[derive(Debug, Serialize)]
pub struct CreatedId {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub is_closed: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: Uuid,
    pub is_closed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_param_accepts_me_and_uuid() {
        assert_eq!(AuthorParam::parse("me").unwrap(), AuthorParam::Me);
        assert_eq!(AuthorParam::parse("ME").unwrap(), AuthorParam::Me);
        let id = Uuid::new_v4();
        assert_eq!(
            AuthorParam::parse(&id.to_string()).unwrap(),
            AuthorParam::User(id)
        );
        assert!(AuthorParam::parse("someone").is_err());
    }

    #[test]
    fn author_me_requires_viewer() {
        let viewer = Uuid::new_v4();
        assert_eq!(AuthorParam::Me.resolve(Some(viewer)).unwrap(), viewer);
        assert!(AuthorParam::Me.resolve(None).is_err());
        let other = Uuid::new_v4();
        assert_eq!(AuthorParam::User(other).resolve(None).unwrap(), other);
    }

    #[test]
    fn sort_maps_to_column() {
        assert_eq!(RecruitingSort::default().column(), "p.created_at");
        assert_eq!(RecruitingSort::Comments.column(), "p.comments_count");
        assert_eq!(RecruitingSort::Views.column(), "p.views_count");
        assert_eq!(RecruitingSort::Bookmark.column(), "p.bookmarks_count");
    }

    #[test]
    fn update_request_checks_lengths() {
        let ok: UpdateRecruitingRequest =
            serde_json::from_str(r#"{"title": "Drummer wanted", "band_name": null}"#).unwrap();
        assert!(ok.check().is_ok());
        assert_eq!(ok.band_name, Some(None));

        let empty_title: UpdateRecruitingRequest =
            serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert!(empty_title.check().is_err());

        let long_band = format!(r#"{{"band_name": "{}"}}"#, "b".repeat(101));
        let long: UpdateRecruitingRequest = serde_json::from_str(&long_band).unwrap();
        assert!(long.check().is_err());
    }

    #[test]
    fn create_request_requires_title_and_content() {
        let body = serde_json::json!({
            "title": "",
            "content": "x",
            "orientation_id": Uuid::new_v4(),
            "recruitment_type_id": Uuid::new_v4(),
        });
        let req: CreateRecruitingRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }
}
