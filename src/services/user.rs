//! Account registration, `/users/me` and account deletion.

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthAppService;
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::user::{LoginType, MeResponse, RegisterRequest, UserCreated};
use crate::services::ProfileService;

#[derive(Clone)]
pub struct UserService {
    db: DbPool,
    profiles: ProfileService,
}

impl UserService {
    pub fn new(db: DbPool, profiles: ProfileService) -> Self {
        Self { db, profiles }
    }

    pub async fn register(&self, req: RegisterRequest) -> AppResult<UserCreated> {
        req.validate()?;
        AuthAppService::validate_nickname(&req.nickname)?;
        let email = req.email.trim().to_lowercase();

        match db::user_identity_taken(&self.db, &email, &req.nickname).await? {
            (true, _) => return Err(AppError::Conflict("Email already registered".to_string())),
            (_, true) => return Err(AppError::Conflict("Nickname already taken".to_string())),
            _ => {}
        }

        let password_hash = AuthAppService::hash_password(&req.password)?;
        let user = db::user_create(
            &self.db,
            &email,
            &password_hash,
            &req.nickname,
            LoginType::Email.as_str(),
        )
        .await?;
        info!(user_id = %user.id, "user registered");
        Ok(UserCreated {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
        })
    }

    pub async fn me(&self, user_id: Uuid) -> AppResult<MeResponse> {
        let user = db::user_get_by_id(&self.db, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let profile = self.profiles.own(user_id).await?;
        Ok(MeResponse {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
            profile,
        })
    }

    /// Delete the account. Rows hanging off the user go by cascade; counters
    /// on other users' rows are released first.
    pub async fn delete(&self, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        db::user_release_bookmarks_of(&mut *tx, user_id).await?;
        db::posts_release_bookmarks_of(&mut *tx, user_id).await?;
        db::posts_release_comments_of(&mut *tx, user_id).await?;
        if !db::user_delete(&mut *tx, user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        tx.commit().await?;
        info!(user_id = %user_id, "user deleted");
        Ok(())
    }
}
