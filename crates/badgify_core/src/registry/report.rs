//! Structured results of registry sync passes.

use crate::model::badge::Badge;
use crate::model::user::UserId;
use crate::repo::RepoError;

/// Result of `Registry::syncdb`.
#[derive(Debug, Default)]
pub struct SyncDbReport {
    /// Badges inserted by this pass.
    pub created: Vec<Badge>,
    /// Recipes whose badge could not be fetched or created.
    pub failed: Vec<SyncFailure>,
}

impl SyncDbReport {
    pub fn into_parts(self) -> (Vec<Badge>, Vec<SyncFailure>) {
        (self.created, self.failed)
    }
}

/// One isolated per-recipe failure.
#[derive(Debug)]
pub struct SyncFailure {
    pub slug: String,
    pub error: RepoError,
}

/// Result of `Registry::sync_users_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountSyncReport {
    /// Badges whose cached `users_count` changed, with the new value.
    pub updated: Vec<Badge>,
    pub unchanged: Vec<Badge>,
}

impl CountSyncReport {
    pub fn into_parts(self) -> (Vec<Badge>, Vec<Badge>) {
        (self.updated, self.unchanged)
    }
}

/// Awards created for one badge during `Registry::sync_awards`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeAwards {
    pub badge: Badge,
    /// Users awarded by this pass, in user id order.
    pub user_ids: Vec<UserId>,
}

/// Result of `Registry::sync_awards`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwardSyncReport {
    /// Badges that gained at least one award.
    pub updated: Vec<BadgeAwards>,
    /// Badges that gained none.
    pub unchanged: Vec<Badge>,
}

impl AwardSyncReport {
    /// Total awards created across all badges.
    pub fn awarded_count(&self) -> usize {
        self.updated.iter().map(|entry| entry.user_ids.len()).sum()
    }
}
