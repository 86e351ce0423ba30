//! Comments on recruiting posts: one level of replies.

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, CommentRow, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::comment::{
    nest_replies, CommentItem, CommentListQuery, CommentListResponse, CommentPostRef,
    CommentScope, CreateCommentRequest, UpdateCommentRequest, COMMENT_LIST_DEFAULT_LIMIT,
    COMMENT_LIST_MAX_LIMIT,
};
use crate::models::pagination::{resolve_limit, CursorPage};
use crate::models::recruiting::CreatedId;
use crate::models::taxonomy::AuthorSummary;

#[derive(Clone)]
pub struct CommentService {
    db: DbPool,
}

impl CommentService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        req: CreateCommentRequest,
    ) -> AppResult<CreatedId> {
        req.validate()?;
        if !db::post_exists(&self.db, post_id).await? {
            return Err(AppError::NotFound("Recruiting post not found".to_string()));
        }
        if let Some(parent_id) = req.parent_comment_id {
            let parent = db::comment_get(&self.db, parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;
            if parent.post_id != post_id || parent.parent_comment_id.is_some() {
                return Err(AppError::BadRequest(
                    "Replies must target a top-level comment of the same post".to_string(),
                ));
            }
        }

        let mut tx = self.db.begin().await?;
        let id = db::comment_create(&mut *tx, post_id, user_id, req.parent_comment_id, &req.content)
            .await?;
        db::post_adjust_comments_count(&mut *tx, post_id, 1).await?;
        tx.commit().await?;
        info!(comment_id = %id, post_id = %post_id, user_id = %user_id, "comment created");
        Ok(CreatedId { id })
    }

    pub async fn list(
        &self,
        viewer: Option<Uuid>,
        query: CommentListQuery,
    ) -> AppResult<CommentListResponse> {
        let scope = query.scope(viewer)?;
        let limit = resolve_limit(query.limit, COMMENT_LIST_DEFAULT_LIMIT, COMMENT_LIST_MAX_LIMIT)?;

        if let Some(cursor) = query.cursor {
            let row = db::comment_get(&self.db, cursor)
                .await?
                .ok_or_else(|| AppError::NotFound("Cursor not found".to_string()))?;
            if let CommentScope::Post(post_id) = scope {
                if row.post_id != post_id || row.parent_comment_id.is_some() {
                    return Err(AppError::BadRequest(
                        "Cursor must be a top-level comment of this post".to_string(),
                    ));
                }
            }
        }

        match scope {
            CommentScope::Post(post_id) => {
                if !db::post_exists(&self.db, post_id).await? {
                    return Err(AppError::NotFound("Recruiting post not found".to_string()));
                }
                let rows =
                    db::comments_top_level_page(&self.db, post_id, query.cursor, limit).await?;
                let page = CursorPage::from_overfetch(rows, limit as usize, |r| r.id);
                let parent_ids: Vec<Uuid> = page.items.iter().map(|r| r.id).collect();
                let replies = db::comments_replies_of(&self.db, &parent_ids)
                    .await?
                    .into_iter()
                    .filter_map(|r| {
                        let parent = r.parent_comment_id?;
                        Some((parent, to_item(r, viewer)))
                    })
                    .collect();
                let page = page.map(|r| to_item(r, viewer));
                Ok(CommentListResponse {
                    next_cursor: page.next_cursor,
                    comments: nest_replies(page.items, replies),
                })
            }
            CommentScope::Author(author_id) => {
                if !db::user_exists(&self.db, author_id).await? {
                    return Err(AppError::NotFound("User not found".to_string()));
                }
                let rows =
                    db::comments_by_author_page(&self.db, author_id, query.cursor, limit).await?;
                let page = CursorPage::from_overfetch(rows, limit as usize, |r| r.id)
                    .map(|r| to_item(r, viewer));
                Ok(CommentListResponse {
                    next_cursor: page.next_cursor,
                    comments: page.items,
                })
            }
        }
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        comment_id: Uuid,
        req: UpdateCommentRequest,
    ) -> AppResult<CommentItem> {
        req.validate()?;
        self.owned(user_id, comment_id).await?;
        db::comment_update_content(&self.db, comment_id, &req.content).await?;
        info!(comment_id = %comment_id, "comment updated");
        let row = db::comment_get(&self.db, comment_id)
            .await?
            .ok_or_else(comment_not_found)?;
        Ok(to_item(row, Some(user_id)))
    }

    /// Delete a comment with its replies and shrink the post's count to match.
    pub async fn delete(&self, user_id: Uuid, comment_id: Uuid) -> AppResult<()> {
        let row = self.owned(user_id, comment_id).await?;
        let mut tx = self.db.begin().await?;
        let removed = db::comment_delete(&mut *tx, comment_id).await?;
        db::post_adjust_comments_count(&mut *tx, row.post_id, -(removed as i32)).await?;
        tx.commit().await?;
        info!(comment_id = %comment_id, post_id = %row.post_id, removed, "comment deleted");
        Ok(())
    }

    async fn owned(&self, user_id: Uuid, comment_id: Uuid) -> AppResult<CommentRow> {
        let row = db::comment_get(&self.db, comment_id)
            .await?
            .ok_or_else(comment_not_found)?;
        if row.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can modify this comment".to_string(),
            ));
        }
        Ok(row)
    }
}

fn to_item(row: CommentRow, viewer: Option<Uuid>) -> CommentItem {
    CommentItem {
        id: row.id,
        content: row.content,
        created_at: row.created_at,
        post: CommentPostRef {
            id: row.post_id,
            title: row.post_title,
        },
        is_owner: viewer == Some(row.user_id),
        author: AuthorSummary {
            user_id: row.user_id,
            nickname: row.author_nickname,
            image_url: row.author_image_url,
        },
        children: Vec::new(),
    }
}

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found".to_string())
}
