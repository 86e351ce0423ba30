//! Bookmarks on users and posts, with their denormalized counters.

use tracing::info;
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::bookmark::BookmarkCreated;

#[derive(Clone)]
pub struct BookmarkService {
    db: DbPool,
}

impl BookmarkService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn bookmark_user(&self, user_id: Uuid, target_id: Uuid) -> AppResult<BookmarkCreated> {
        if !db::user_exists(&self.db, target_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if user_id == target_id {
            return Err(AppError::BadRequest("You cannot bookmark yourself".to_string()));
        }
        let mut tx = self.db.begin().await?;
        let row = db::user_bookmark_insert(&mut *tx, user_id, target_id)
            .await?
            .ok_or_else(|| AppError::Conflict("User already bookmarked".to_string()))?;
        db::user_adjust_bookmark_count(&mut *tx, target_id, 1).await?;
        tx.commit().await?;
        info!(user_id = %user_id, target_id = %target_id, "user bookmarked");
        Ok(BookmarkCreated {
            id: row.id,
            message: "User bookmarked",
            created_at: row.created_at,
        })
    }

    pub async fn unbookmark_user(&self, user_id: Uuid, target_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        if !db::user_bookmark_delete(&mut *tx, user_id, target_id).await? {
            return Err(AppError::NotFound("Bookmark not found".to_string()));
        }
        db::user_adjust_bookmark_count(&mut *tx, target_id, -1).await?;
        tx.commit().await?;
        info!(user_id = %user_id, target_id = %target_id, "user bookmark removed");
        Ok(())
    }

    pub async fn bookmark_post(&self, user_id: Uuid, post_id: Uuid) -> AppResult<BookmarkCreated> {
        if !db::post_exists(&self.db, post_id).await? {
            return Err(AppError::NotFound("Recruiting post not found".to_string()));
        }
        let mut tx = self.db.begin().await?;
        let row = db::post_bookmark_insert(&mut *tx, user_id, post_id)
            .await?
            .ok_or_else(|| AppError::Conflict("Post already bookmarked".to_string()))?;
        db::post_adjust_bookmarks_count(&mut *tx, post_id, 1).await?;
        tx.commit().await?;
        info!(user_id = %user_id, post_id = %post_id, "post bookmarked");
        Ok(BookmarkCreated {
            id: row.id,
            message: "Post bookmarked",
            created_at: row.created_at,
        })
    }

    pub async fn unbookmark_post(&self, user_id: Uuid, post_id: Uuid) -> AppResult<()> {
        if !db::post_exists(&self.db, post_id).await? {
            return Err(AppError::NotFound("Recruiting post not found".to_string()));
        }
        let mut tx = self.db.begin().await?;
        if !db::post_bookmark_delete(&mut *tx, user_id, post_id).await? {
            return Err(AppError::NotFound("Bookmark not found".to_string()));
        }
        db::post_adjust_bookmarks_count(&mut *tx, post_id, -1).await?;
        tx.commit().await?;
        info!(user_id = %user_id, post_id = %post_id, "post bookmark removed");
        Ok(())
    }
}
