//! Reference data (regions, positions, genres, ...) as it appears in responses.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// `{id, name}` pair for any master-data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

/// Author block embedded in posts and comments.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorSummary {
    pub user_id: Uuid,
    pub nickname: String,
    pub image_url: Option<String>,
}

/// Flat position entry used by recruiting posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionLevel {
    pub position_id: Uuid,
    pub position_name: String,
    pub experienced_level_id: Uuid,
    pub experienced_level_name: String,
}

/// Nested position entry used by profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionWithExperience {
    pub position: NamedRef,
    pub experience_level: NamedRef,
}

/// A link-table row joined with its names, keyed by the owning post/profile.
#[derive(Debug, Clone, FromRow)]
pub struct OwnedNamedRef {
    pub owner_id: Uuid,
    pub id: Uuid,
    pub name: String,
}

/// A position link row joined with position and level names.
#[derive(Debug, Clone, FromRow)]
pub struct OwnedPosition {
    pub owner_id: Uuid,
    pub position_id: Uuid,
    pub position_name: String,
    pub level_id: Uuid,
    pub level_name: String,
}

impl From<OwnedNamedRef> for NamedRef {
    fn from(row: OwnedNamedRef) -> Self {
        NamedRef {
            id: row.id,
            name: row.name,
        }
    }
}

impl From<OwnedPosition> for PositionLevel {
    fn from(row: OwnedPosition) -> Self {
        PositionLevel {
            position_id: row.position_id,
            position_name: row.position_name,
            experienced_level_id: row.level_id,
            experienced_level_name: row.level_name,
        }
    }
}

impl From<OwnedPosition> for PositionWithExperience {
    fn from(row: OwnedPosition) -> Self {
        PositionWithExperience {
            position: NamedRef {
                id: row.position_id,
                name: row.position_name,
            },
            experience_level: NamedRef {
                id: row.level_id,
                name: row.level_name,
            },
        }
    }
}
