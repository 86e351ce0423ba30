//! Token endpoints: login, refresh, logout.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::ApiForm;
use crate::models::user::{LoginForm, TokenResponse};
use crate::services::TokenPair;

pub const REFRESH_COOKIE: &str = "refresh_token";

fn refresh_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let max_age = time::Duration::seconds(state.jwt_secret().refresh_ttl().num_seconds());
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(state.cookie_secure)
        .max_age(max_age)
        .build()
}

fn with_pair(state: &AppState, jar: CookieJar, pair: TokenPair) -> (CookieJar, Json<TokenResponse>) {
    let body = pair.body();
    let jar = jar.add(refresh_cookie(state, pair.refresh.token));
    (jar, Json(body))
}

/// POST /api/v1/auth/token
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let pair = state.tokens.login(form).await?;
    Ok(with_pair(&state, jar, pair))
}

/// POST /api/v1/auth/token/refresh
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let pair = state.tokens.refresh(presented.as_deref()).await?;
    Ok(with_pair(&state, jar, pair))
}

/// DELETE /api/v1/auth/token
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AppError> {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    state.tokens.logout(presented.as_deref()).await?;
    let jar = jar.remove(Cookie::build(REFRESH_COOKIE).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}
