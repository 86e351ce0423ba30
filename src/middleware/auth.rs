//! Bearer-token extractors: required (`AuthUser`) and optional (`MaybeAuthUser`).

use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use tracing::debug;
use uuid::Uuid;

use crate::auth::TokenKind;
use crate::db;
use crate::error::AppError;
use crate::handlers::http::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Extractor: authenticated, active user id from an access token.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser(pub Uuid);

/// Extractor: like `AuthUser`, but a request without `Authorization` is
/// anonymous. A header that is present but unusable is still rejected.
#[derive(Clone, Copy, Debug)]
pub struct MaybeAuthUser(pub Option<Uuid>);

fn bearer(headers: &HeaderMap) -> Option<Result<&str, AppError>> {
    let value = headers.get(AUTHORIZATION)?;
    Some(
        value
            .to_str()
            .ok()
            .and_then(|s| s.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Auth("Missing or invalid Authorization header".to_string())),
    )
}

async fn authenticate(state: &AppState, token: &str) -> Result<Uuid, AppError> {
    let verified = state.jwt_secret().validate(token, TokenKind::Access)?;
    match db::user_get_by_id(state.db(), verified.user_id).await? {
        Some(user) if user.is_active => Ok(user.id),
        _ => {
            debug!(user_id = %verified.user_id, "token for missing or inactive user");
            Err(AppError::Auth("Could not validate credentials".to_string()))
        }
    }
}

#[axum::async_trait]
impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(&parts.headers).unwrap_or_else(|| {
            Err(AppError::Auth("Missing or invalid Authorization header".to_string()))
        })?;
        Ok(AuthUser(authenticate(state, token).await?))
    }
}

#[axum::async_trait]
impl axum::extract::FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer(&parts.headers) {
            None => Ok(MaybeAuthUser(None)),
            Some(token) => Ok(MaybeAuthUser(Some(authenticate(state, token?).await?))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer(&headers).unwrap().unwrap(), "abc.def");

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert!(bearer(&headers).unwrap().is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer(&headers).unwrap().is_err());
    }
}
