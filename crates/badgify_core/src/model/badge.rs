//! Badge record.

use serde::{Deserialize, Serialize};

/// Storage row identifier for badges.
pub type BadgeId = i64;

/// Persisted achievement, one per recipe slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    /// Unique key shared with the recipe that produced this badge.
    pub slug: String,
    pub name: String,
    pub description: String,
    pub points: i64,
    /// Denormalized award count, refreshed by `sync_users_count`.
    ///
    /// May lag behind the awards table between sync passes.
    pub users_count: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Values used when a badge row has to be created for a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeDefaults {
    pub name: String,
    pub description: String,
    pub points: i64,
}
