//! Award record linking one user to one badge.

use crate::model::badge::BadgeId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type AwardId = i64;

/// A user has earned a badge.
///
/// Awards are never revoked by sync passes; removal is an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub id: AwardId,
    pub user_id: UserId,
    pub badge_id: BadgeId,
    /// Unix epoch milliseconds.
    pub awarded_at: i64,
}
