//! Badge repository contract and SQLite implementation.
//!
//! # Invariants
//! - `slug` is the natural key; fetch-or-create never produces duplicates.
//! - `users_count` is only written by count reconciliation.

use crate::model::badge::{Badge, BadgeDefaults, BadgeId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(crate) const BADGE_SELECT_SQL: &str = "SELECT
    badges.id,
    badges.slug,
    badges.name,
    badges.description,
    badges.points,
    badges.users_count,
    badges.created_at
FROM badges";

/// Repository interface for badge rows.
pub trait BadgeRepository {
    fn get_badge_by_slug(&self, slug: &str) -> RepoResult<Option<Badge>>;
    /// Returns the badge for `slug`, inserting it with `defaults` when absent.
    ///
    /// The boolean is `true` when this call created the row.
    fn get_or_create_badge(&self, slug: &str, defaults: &BadgeDefaults)
        -> RepoResult<(Badge, bool)>;
    /// Lists every badge in creation order.
    fn list_badges(&self) -> RepoResult<Vec<Badge>>;
    fn update_users_count(&self, id: BadgeId, users_count: i64) -> RepoResult<()>;
}

/// SQLite-backed badge repository.
pub struct SqliteBadgeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBadgeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BadgeRepository for SqliteBadgeRepository<'_> {
    fn get_badge_by_slug(&self, slug: &str) -> RepoResult<Option<Badge>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BADGE_SELECT_SQL} WHERE badges.slug = ?1;"))?;
        let badge = stmt
            .query_row([slug], |row| Ok(parse_badge_row(row)))
            .optional()?;
        badge.transpose()
    }

    fn get_or_create_badge(
        &self,
        slug: &str,
        defaults: &BadgeDefaults,
    ) -> RepoResult<(Badge, bool)> {
        if slug.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "badge slug must not be blank".to_string(),
            ));
        }

        let inserted = self.conn.execute(
            "INSERT INTO badges (slug, name, description, points)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (slug) DO NOTHING;",
            params![
                slug,
                defaults.name.as_str(),
                defaults.description.as_str(),
                defaults.points,
            ],
        )?;

        let badge = self
            .get_badge_by_slug(slug)?
            .ok_or_else(|| RepoError::not_found("badge", slug))?;
        Ok((badge, inserted == 1))
    }

    fn list_badges(&self) -> RepoResult<Vec<Badge>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BADGE_SELECT_SQL} ORDER BY badges.id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut badges = Vec::new();
        while let Some(row) = rows.next()? {
            badges.push(parse_badge_row(row)?);
        }
        Ok(badges)
    }

    fn update_users_count(&self, id: BadgeId, users_count: i64) -> RepoResult<()> {
        if users_count < 0 {
            return Err(RepoError::InvalidData(format!(
                "users_count must not be negative, got {users_count}"
            )));
        }
        let changed = self.conn.execute(
            "UPDATE badges SET users_count = ?1 WHERE id = ?2;",
            params![users_count, id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("badge", id));
        }
        Ok(())
    }
}

pub(crate) fn parse_badge_row(row: &Row<'_>) -> RepoResult<Badge> {
    let slug: String = row.get("slug")?;
    if slug.trim().is_empty() {
        return Err(RepoError::InvalidData(
            "blank slug in badges.slug".to_string(),
        ));
    }
    let users_count: i64 = row.get("users_count")?;
    if users_count < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative users_count `{users_count}` for badge `{slug}`"
        )));
    }

    Ok(Badge {
        id: row.get("id")?,
        slug,
        name: row.get("name")?,
        description: row.get("description")?,
        points: row.get("points")?,
        users_count,
        created_at: row.get("created_at")?,
    })
}
