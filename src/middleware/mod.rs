//! Request extractors shared by the handlers.

pub mod auth;
pub mod extract;

pub use auth::{AuthUser, MaybeAuthUser};
pub use extract::{ApiForm, ApiJson, ApiPath, ApiQuery};
