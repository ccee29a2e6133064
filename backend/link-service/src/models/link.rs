use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Link model
///
/// `posted_by_id` is `None` for links created without an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Link {
    pub id: i32,
    pub description: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub posted_by_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewLink {
    pub description: String,
    pub url: String,
    pub posted_by_id: Option<i32>,
}

/// Replacement values for `updateLink`; both fields are always written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChanges {
    pub description: String,
    pub url: String,
}

/// A row of the votes join relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromRow)]
pub struct Vote {
    pub link_id: i32,
    pub user_id: i32,
}
