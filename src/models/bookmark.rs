//! Bookmark responses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct BookmarkCreated {
    pub id: Uuid,
    pub message: &'static str,
    pub created_at: DateTime<Utc>,
}
