//! Login, refresh-token rotation and logout.

use chrono::Utc;
use tracing::{debug, info};

use crate::auth::{AuthAppService, IssuedToken, JwtSecret, TokenKind};
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::user::{LoginForm, TokenResponse};

/// A freshly issued token pair; `refresh` also goes into the cookie.
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

impl TokenPair {
    pub fn body(&self) -> TokenResponse {
        TokenResponse::bearer(self.access.token.clone(), self.refresh.token.clone())
    }
}

#[derive(Clone)]
pub struct TokenService {
    db: DbPool,
    jwt: JwtSecret,
}

impl TokenService {
    pub fn new(db: DbPool, jwt: JwtSecret) -> Self {
        Self { db, jwt }
    }

    pub async fn login(&self, form: LoginForm) -> AppResult<TokenPair> {
        let email = form.username.trim().to_lowercase();
        let user = db::user_find_by_email(&self.db, &email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if !AuthAppService::verify_password(&form.password, user.password_hash.as_deref())? {
            return Err(AppError::Auth("Incorrect email or password".to_string()));
        }
        if !user.is_active {
            return Err(AppError::Forbidden("Inactive user".to_string()));
        }

        let pair = self.issue_pair(user.id).await?;
        db::user_touch_login(&self.db, user.id).await?;
        info!(user_id = %user.id, "user logged in");
        Ok(pair)
    }

    /// Exchange a live refresh token for a new pair; the old one is revoked.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> AppResult<TokenPair> {
        let token =
            refresh_token.ok_or_else(|| AppError::Auth("Refresh token missing".to_string()))?;
        let verified = self.jwt.validate(token, TokenKind::Refresh)?;
        let stored = db::refresh_token_find(&self.db, verified.jti)
            .await?
            .filter(|row| row.user_id == verified.user_id && row.is_usable(Utc::now()))
            .ok_or_else(|| AppError::Auth("Refresh token is invalid or revoked".to_string()))?;

        let user = db::user_get_by_id(&self.db, stored.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Auth("User not found or inactive".to_string()))?;

        let access = self.jwt.issue_access(user.id)?;
        let refresh = self.jwt.issue_refresh(user.id)?;
        let rotated = db::refresh_token_rotate(
            &self.db,
            user.id,
            stored.jti,
            refresh.jti,
            refresh.expires_at,
        )
        .await?;
        if !rotated {
            return Err(AppError::Auth("Refresh token is invalid or revoked".to_string()));
        }
        let pair = TokenPair { access, refresh };
        debug!(user_id = %user.id, old_jti = %stored.jti, new_jti = %pair.refresh.jti, "refresh token rotated");
        Ok(pair)
    }

    /// Revoke the presented refresh token when it is valid; anything else is ignored.
    pub async fn logout(&self, refresh_token: Option<&str>) -> AppResult<()> {
        let Some(token) = refresh_token else {
            return Ok(());
        };
        match self.jwt.validate(token, TokenKind::Refresh) {
            Ok(verified) => {
                let mut conn = self.db.acquire().await?;
                db::refresh_token_revoke(&mut *conn, verified.jti).await?;
                info!(user_id = %verified.user_id, "user logged out");
            }
            Err(e) => debug!(error = %e, "logout with unusable refresh token"),
        }
        Ok(())
    }

    async fn issue_pair(&self, user_id: uuid::Uuid) -> AppResult<TokenPair> {
        let access = self.jwt.issue_access(user_id)?;
        let refresh = self.jwt.issue_refresh(user_id)?;
        let mut conn = self.db.acquire().await?;
        db::refresh_token_store(&mut *conn, user_id, refresh.jti, refresh.expires_at).await?;
        Ok(TokenPair { access, refresh })
    }
}
