//! HTTP request handlers, one module per resource.

pub mod bookmarks;
pub mod comments;
pub mod http;
pub mod master_data;
pub mod profiles;
pub mod recruiting;
pub mod uploads;
pub mod users;

pub use http::*;
