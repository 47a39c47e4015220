//! Ordered sync passes over one registry and one store.
//!
//! # Invariants
//! - `sync_all` runs badges, then awards, then counts, so a fresh database
//!   converges in one call.
//! - `reset_awards` only touches badges of registered recipes.

use crate::model::badge::BadgeId;
use crate::registry::{
    AwardSyncReport, BadgeSelection, CountSyncReport, Registry, RegistryError, SyncDbReport,
};
use crate::repo::award_repo::{AwardRepository, SqliteAwardRepository};
use crate::repo::badge_repo::{BadgeRepository, SqliteBadgeRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserListQuery, UserRepository};
use log::{info, warn};
use rusqlite::Connection;

/// Combined result of `SyncService::sync_all`.
#[derive(Debug)]
pub struct FullSyncReport {
    pub badges: SyncDbReport,
    pub awards: AwardSyncReport,
    pub counts: CountSyncReport,
}

/// Result of `SyncService::reset_awards`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReport {
    pub deleted_awards: usize,
    pub counts: CountSyncReport,
}

/// Sync driver pairing a registry with its repositories.
pub struct SyncService<'r, B, A, U> {
    registry: &'r Registry,
    badges: B,
    awards: A,
    users: U,
}

impl<'r, 'conn>
    SyncService<
        'r,
        SqliteBadgeRepository<'conn>,
        SqliteAwardRepository<'conn>,
        SqliteUserRepository<'conn>,
    >
{
    /// Driver over SQLite repositories sharing one connection.
    pub fn sqlite(registry: &'r Registry, conn: &'conn Connection) -> Self {
        Self::new(
            registry,
            SqliteBadgeRepository::new(conn),
            SqliteAwardRepository::new(conn),
            SqliteUserRepository::new(conn),
        )
    }
}

impl<'r, B: BadgeRepository, A: AwardRepository, U: UserRepository> SyncService<'r, B, A, U> {
    pub fn new(registry: &'r Registry, badges: B, awards: A, users: U) -> Self {
        Self {
            registry,
            badges,
            awards,
            users,
        }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Creates missing badge rows for every registered recipe.
    pub fn sync_badges(&self) -> SyncDbReport {
        self.registry.syncdb(&self.badges)
    }

    pub fn sync_awards<'a>(
        &self,
        badges: impl Into<BadgeSelection<'a>>,
        users: &UserListQuery,
    ) -> Result<AwardSyncReport, RegistryError> {
        self.registry
            .sync_awards(badges, users, &self.badges, &self.awards, &self.users)
    }

    pub fn sync_counts<'a>(
        &self,
        badges: impl Into<BadgeSelection<'a>>,
    ) -> Result<CountSyncReport, RegistryError> {
        self.registry
            .sync_users_count(badges, &self.badges, &self.awards)
    }

    /// Runs every pass; the selection applies to awards and counts.
    ///
    /// Badge creation failures are reported, and the affected recipes are
    /// left out of the later passes.
    pub fn sync_all<'a>(
        &self,
        badges: impl Into<BadgeSelection<'a>>,
    ) -> Result<FullSyncReport, RegistryError> {
        let selection = badges.into();
        let badge_report = self.sync_badges();

        let failed: Vec<&str> = badge_report
            .failed
            .iter()
            .map(|failure| failure.slug.as_str())
            .collect();
        let selection = if failed.is_empty() {
            selection
        } else {
            warn!(
                "event=sync_all module=service status=degraded failed_badges={}",
                failed.len()
            );
            let selected: Vec<&str> = match &selection {
                BadgeSelection::All => self
                    .registry
                    .recipes()
                    .keys()
                    .map(String::as_str)
                    .collect(),
                BadgeSelection::Slugs(slugs) => slugs.clone(),
            };
            BadgeSelection::Slugs(
                selected
                    .into_iter()
                    .filter(|slug| !failed.contains(slug))
                    .collect(),
            )
        };

        let awards = self.sync_awards(selection.clone(), &UserListQuery::default())?;
        let counts = self.sync_counts(selection)?;

        info!(
            "event=sync_all module=service status=ok created={} failed={} awarded={} counts_updated={}",
            badge_report.created.len(),
            badge_report.failed.len(),
            awards.awarded_count(),
            counts.updated.len()
        );
        Ok(FullSyncReport {
            badges: badge_report,
            awards,
            counts,
        })
    }

    /// Deletes awards of the selected badges and refreshes their counts.
    ///
    /// Recipes without a badge row hold no awards and are skipped.
    pub fn reset_awards<'a>(
        &self,
        badges: impl Into<BadgeSelection<'a>>,
    ) -> Result<ResetReport, RegistryError> {
        let instances = self.registry.get_recipe_instances(badges);
        let mut badge_ids: Vec<BadgeId> = Vec::new();
        let mut slugs: Vec<&str> = Vec::new();
        for instance in &instances {
            match instance.badge(&self.badges) {
                Ok(badge) => {
                    badge_ids.push(badge.id);
                    slugs.push(instance.slug());
                }
                Err(RegistryError::BadgeRecordMissing(_)) => {}
                Err(err) => return Err(err),
            }
        }

        let deleted_awards = self.awards.delete_awards(Some(badge_ids.as_slice()))?;
        let counts = self.sync_counts(slugs)?;

        info!(
            "event=reset_awards module=service status=ok badges={} deleted={}",
            badge_ids.len(),
            deleted_awards
        );
        Ok(ResetReport {
            deleted_awards,
            counts,
        })
    }
}
