//! Refresh token ledger: one row per issued refresh `jti`.

use crate::error::AppResult;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use super::DbPool;

#[derive(Debug, FromRow)]
pub struct RefreshTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub jti: Uuid,
    pub expired_at: DateTime<Utc>,
    pub is_revoked: bool,
}

impl RefreshTokenRow {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && self.expired_at > now
    }
}

pub async fn refresh_token_store(
    conn: &mut PgConnection,
    user_id: Uuid,
    jti: Uuid,
    expired_at: DateTime<Utc>,
) -> AppResult<()> {
    sqlx::query("INSERT INTO refresh_tokens (user_id, jti, expired_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(jti)
        .bind(expired_at)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn refresh_token_find(pool: &DbPool, jti: Uuid) -> AppResult<Option<RefreshTokenRow>> {
    let row = sqlx::query_as::<_, RefreshTokenRow>(
        "SELECT id, user_id, jti, expired_at, is_revoked FROM refresh_tokens WHERE jti = $1",
    )
    .bind(jti)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Revoke `jti`. Returns false when it was unknown or already revoked.
pub async fn refresh_token_revoke(conn: &mut PgConnection, jti: Uuid) -> AppResult<bool> {
    let r = sqlx::query(
        "UPDATE refresh_tokens SET is_revoked = TRUE, updated_at = now() WHERE jti = $1 AND is_revoked = FALSE",
    )
    .bind(jti)
    .execute(conn)
    .await?;
    Ok(r.rows_affected() > 0)
}

/// Revoke `old_jti` and record `new_jti` atomically. Returns false, with
/// nothing written, when `old_jti` was unknown or already revoked.
pub async fn refresh_token_rotate(
    pool: &DbPool,
    user_id: Uuid,
    old_jti: Uuid,
    new_jti: Uuid,
    expired_at: DateTime<Utc>,
) -> AppResult<bool> {
    let mut tx = pool.begin().await?;
    if !refresh_token_revoke(&mut *tx, old_jti).await? {
        return Ok(false);
    }
    refresh_token_store(&mut *tx, user_id, new_jti, expired_at).await?;
    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(expired_at: DateTime<Utc>, is_revoked: bool) -> RefreshTokenRow {
        RefreshTokenRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            expired_at,
            is_revoked,
        }
    }

    #[test]
    fn usable_only_when_live_and_not_revoked() {
        let now = Utc::now();
        assert!(row(now + Duration::days(1), false).is_usable(now));
        assert!(!row(now + Duration::days(1), true).is_usable(now));
        assert!(!row(now - Duration::seconds(1), false).is_usable(now));
    }
}
