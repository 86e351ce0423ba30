//! Credential helpers: argon2 password hashing and account field checks.

use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub struct AuthAppService;

impl AuthAppService {
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    /// Social accounts have no stored hash and never match a password.
    pub fn verify_password(password: &str, hash: Option<&str>) -> AppResult<bool> {
        let Some(hash) = hash else {
            return Ok(false);
        };
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("parse hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Nicknames are shown in listings; surrounding whitespace and control
    /// characters are not allowed.
    pub fn validate_nickname(nickname: &str) -> AppResult<()> {
        if nickname.trim() != nickname || nickname.chars().any(char::is_control) {
            return Err(AppError::Validation("Invalid nickname".to_string()));
        }
        Ok(())
    }
}
