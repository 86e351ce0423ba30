//! Comment payloads and reply-tree assembly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::taxonomy::AuthorSummary;
use crate::error::{AppError, AppResult};

pub const COMMENT_LIST_DEFAULT_LIMIT: i64 = 20;
pub const COMMENT_LIST_MAX_LIMIT: i64 = 20;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentListQuery {
    pub post_id: Option<Uuid>,
    pub author: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<Uuid>,
}

/// Which comments a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentScope {
    Post(Uuid),
    Author(Uuid),
}

impl CommentListQuery {
    /// Exactly one of `post_id` and `author` must be given.
    pub fn scope(&self, viewer: Option<Uuid>) -> AppResult<CommentScope> {
        match (self.post_id, self.author.as_deref()) {
            (Some(post_id), None) => Ok(CommentScope::Post(post_id)),
            (None, Some(author)) => {
                let author = super::recruiting::AuthorParam::parse(author)?.resolve(viewer)?;
                Ok(CommentScope::Author(author))
            }
            _ => Err(AppError::BadRequest(
                "Exactly one of post_id or author must be provided".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentPostRef {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentItem {
    pub id: Uuid,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub post: CommentPostRef,
    pub is_owner: bool,
    pub author: AuthorSummary,
    pub children: Vec<CommentItem>,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub next_cursor: Option<Uuid>,
    pub comments: Vec<CommentItem>,
}

/// Attach replies to their parents. Replies keep their input order; replies
/// whose parent is not in `parents` are dropped.
pub fn nest_replies(mut parents: Vec<CommentItem>, replies: Vec<(Uuid, CommentItem)>) -> Vec<CommentItem> {
    let index: HashMap<Uuid, usize> = parents
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i))
        .collect();
    for (parent_id, reply) in replies {
        if let Some(&i) = index.get(&parent_id) {
            parents[i].children.push(reply);
        }
    }
    parents
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(content: &str) -> CommentItem {
        CommentItem {
            id: Uuid::new_v4(),
            content: content.to_string(),
            created_at: chrono::Utc::now(),
            post: CommentPostRef {
                id: Uuid::nil(),
                title: "post".into(),
            },
            is_owner: false,
            author: AuthorSummary {
                user_id: Uuid::nil(),
                nickname: "n".into(),
                image_url: None,
            },
            children: Vec::new(),
        }
    }

    #[test]
    fn replies_attach_to_parents_in_order() {
        let a = item("a");
        let b = item("b");
        let (a_id, b_id) = (a.id, b.id);
        let replies = vec![
            (a_id, item("a1")),
            (b_id, item("b1")),
            (a_id, item("a2")),
            (Uuid::new_v4(), item("orphan")),
        ];
        let tree = nest_replies(vec![a, b], replies);
        assert_eq!(tree.len(), 2);
        let a_children: Vec<_> = tree[0].children.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(a_children, ["a1", "a2"]);
        assert_eq!(tree[1].children.len(), 1);
    }

    #[test]
    fn scope_requires_exactly_one_selector() {
        let both = CommentListQuery {
            post_id: Some(Uuid::new_v4()),
            author: Some("me".into()),
            limit: None,
            cursor: None,
        };
        assert!(both.scope(Some(Uuid::new_v4())).is_err());

        let neither = CommentListQuery {
            post_id: None,
            author: None,
            limit: None,
            cursor: None,
        };
        assert!(neither.scope(None).is_err());

        let viewer = Uuid::new_v4();
        let mine = CommentListQuery {
            post_id: None,
            author: Some("me".into()),
            limit: None,
            cursor: None,
        };
        assert_eq!(mine.scope(Some(viewer)).unwrap(), CommentScope::Author(viewer));
    }

    #[test]
    fn content_length_is_bounded() {
        let ok = CreateCommentRequest {
            content: "welcome".into(),
            parent_comment_id: None,
        };
        assert!(ok.validate().is_ok());
        let long = UpdateCommentRequest {
            content: "x".repeat(1001),
        };
        assert!(long.validate().is_err());
    }
}
