//! Account registration, login and `/users/me` payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::profile::ProfileDetail;

/// How the account signs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginType {
    Email,
    Social,
}

impl LoginType {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginType::Email => "email",
            LoginType::Social => "social",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 20, message = "nickname must be 1-20 characters"))]
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct UserCreated {
    pub id: Uuid,
    pub email: Option<String>,
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub nickname: String,
    pub profile: Option<ProfileDetail>,
}

/// OAuth2 password-flow form: `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer",
        }
    }
}
