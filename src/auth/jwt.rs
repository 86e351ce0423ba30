//! JWT issue and validation for access and refresh tokens.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub typ: TokenKind,
}

/// A signed token plus the identifiers needed to persist it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Validated token contents.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedToken {
    pub user_id: Uuid,
    pub jti: Uuid,
}

#[derive(Clone)]
pub struct JwtSecret {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtSecret {
    pub fn new(secret: String, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secret,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access(&self, user_id: Uuid) -> AppResult<IssuedToken> {
        self.issue(user_id, TokenKind::Access, self.access_ttl)
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> AppResult<IssuedToken> {
        self.issue(user_id, TokenKind::Refresh, self.refresh_ttl)
    }

    fn issue(&self, user_id: Uuid, typ: TokenKind, ttl: Duration) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let jti = Uuid::new_v4();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: jti.to_string(),
            typ,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Jwt(e.to_string()))?;
        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Validate signature, expiry and token kind.
    pub fn validate(&self, token: &str, expected: TokenKind) -> AppResult<VerifiedToken> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AppError::Jwt(e.to_string()))?;
        if data.claims.typ != expected {
            return Err(AppError::Jwt("Unexpected token type".to_string()));
        }
        let user_id =
            Uuid::parse_str(&data.claims.sub).map_err(|e| AppError::Jwt(e.to_string()))?;
        let jti = Uuid::parse_str(&data.claims.jti).map_err(|e| AppError::Jwt(e.to_string()))?;
        Ok(VerifiedToken { user_id, jti })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> JwtSecret {
        JwtSecret::new(
            "test-jwt-secret-min-32-chars!!!!".to_string(),
            Duration::minutes(30),
            Duration::days(7),
        )
    }

    #[test]
    fn access_token_round_trips_user_id() {
        let jwt = secret();
        let user_id = Uuid::new_v4();
        let issued = jwt.issue_access(user_id).unwrap();
        let verified = jwt.validate(&issued.token, TokenKind::Access).unwrap();
        assert_eq!(verified.user_id, user_id);
        assert_eq!(verified.jti, issued.jti);
    }

    #[test]
    fn refresh_token_is_not_accepted_as_access() {
        let jwt = secret();
        let issued = jwt.issue_refresh(Uuid::new_v4()).unwrap();
        assert!(jwt.validate(&issued.token, TokenKind::Access).is_err());
        assert!(jwt.validate(&issued.token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issued = secret().issue_access(Uuid::new_v4()).unwrap();
        let other = JwtSecret::new(
            "another-secret-that-is-32-chars-long".to_string(),
            Duration::minutes(30),
            Duration::days(7),
        );
        assert!(other.validate(&issued.token, TokenKind::Access).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JwtSecret::new(
            "test-jwt-secret-min-32-chars!!!!".to_string(),
            Duration::minutes(-10),
            Duration::days(7),
        );
        let issued = jwt.issue_access(Uuid::new_v4()).unwrap();
        assert!(jwt.validate(&issued.token, TokenKind::Access).is_err());
    }
}
