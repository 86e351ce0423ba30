//! Authentication: password hashing, JWT issue/validation and token endpoints.

mod handlers;
mod jwt;
mod service;

pub use handlers::{login, logout, refresh, REFRESH_COOKIE};
pub use jwt::{Claims, IssuedToken, JwtSecret, TokenKind, VerifiedToken};
pub use service::AuthAppService;
