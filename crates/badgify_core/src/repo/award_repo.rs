//! Award repository contract and SQLite implementation.
//!
//! # Invariants
//! - The `(user_id, badge_id)` unique index makes awarding idempotent;
//!   inserting an existing pair is skipped, not an error.
//! - Bulk inserts run in one transaction per batch.
//! - Bulk deletes split long badge id lists into several statements inside
//!   one transaction.

use crate::model::award::Award;
use crate::model::badge::{Badge, BadgeId};
use crate::model::user::UserId;
use crate::repo::badge_repo::{parse_badge_row, BADGE_SELECT_SQL};
use crate::repo::{placeholders, RepoResult, MAX_IN_BINDS};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

const AWARD_SELECT_SQL: &str = "SELECT id, user_id, badge_id, awarded_at FROM awards";

/// Repository interface for award rows.
pub trait AwardRepository {
    /// Counts award rows referencing one badge.
    fn count_awards_for_badge(&self, badge_id: BadgeId) -> RepoResult<i64>;
    fn list_awarded_user_ids(&self, badge_id: BadgeId) -> RepoResult<BTreeSet<UserId>>;
    fn get_award(&self, user_id: UserId, badge_id: BadgeId) -> RepoResult<Option<Award>>;
    /// Creates one award; returns `None` when the pair is already awarded.
    fn create_award(&self, user_id: UserId, badge_id: BadgeId) -> RepoResult<Option<Award>>;
    /// Awards `badge_id` to every user in `user_ids`, `batch_size` rows per
    /// transaction. Returns the user ids that received a new award.
    fn create_awards(
        &self,
        badge_id: BadgeId,
        user_ids: &[UserId],
        batch_size: usize,
    ) -> RepoResult<Vec<UserId>>;
    /// Lists badges awarded to one user, oldest award first.
    fn list_badges_for_user(&self, user_id: UserId) -> RepoResult<Vec<Badge>>;
    /// Deletes awards for the given badges, or every award when `None`.
    fn delete_awards(&self, badge_ids: Option<&[BadgeId]>) -> RepoResult<usize>;
}

/// SQLite-backed award repository.
pub struct SqliteAwardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAwardRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AwardRepository for SqliteAwardRepository<'_> {
    fn count_awards_for_badge(&self, badge_id: BadgeId) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM awards WHERE badge_id = ?1;",
            [badge_id],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count)
    }

    fn list_awarded_user_ids(&self, badge_id: BadgeId) -> RepoResult<BTreeSet<UserId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id FROM awards WHERE badge_id = ?1;")?;
        let mut rows = stmt.query([badge_id])?;
        let mut user_ids = BTreeSet::new();
        while let Some(row) = rows.next()? {
            user_ids.insert(row.get::<_, UserId>(0)?);
        }
        Ok(user_ids)
    }

    fn get_award(&self, user_id: UserId, badge_id: BadgeId) -> RepoResult<Option<Award>> {
        let award = self
            .conn
            .query_row(
                &format!("{AWARD_SELECT_SQL} WHERE user_id = ?1 AND badge_id = ?2;"),
                params![user_id, badge_id],
                parse_award_row,
            )
            .optional()?;
        Ok(award)
    }

    fn create_award(&self, user_id: UserId, badge_id: BadgeId) -> RepoResult<Option<Award>> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO awards (user_id, badge_id) VALUES (?1, ?2);",
            params![user_id, badge_id],
        )?;
        if inserted == 0 {
            return Ok(None);
        }
        self.get_award(user_id, badge_id)
    }

    fn create_awards(
        &self,
        badge_id: BadgeId,
        user_ids: &[UserId],
        batch_size: usize,
    ) -> RepoResult<Vec<UserId>> {
        let mut awarded = Vec::new();
        for batch in user_ids.chunks(batch_size.max(1)) {
            let tx = self.conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT OR IGNORE INTO awards (user_id, badge_id) VALUES (?1, ?2);",
                )?;
                for &user_id in batch {
                    if stmt.execute(params![user_id, badge_id])? == 1 {
                        awarded.push(user_id);
                    }
                }
            }
            tx.commit()?;
        }
        Ok(awarded)
    }

    fn list_badges_for_user(&self, user_id: UserId) -> RepoResult<Vec<Badge>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BADGE_SELECT_SQL}
             INNER JOIN awards ON awards.badge_id = badges.id
             WHERE awards.user_id = ?1
             ORDER BY awards.awarded_at ASC, awards.id ASC;"
        ))?;
        let mut rows = stmt.query([user_id])?;
        let mut badges = Vec::new();
        while let Some(row) = rows.next()? {
            badges.push(parse_badge_row(row)?);
        }
        Ok(badges)
    }

    fn delete_awards(&self, badge_ids: Option<&[BadgeId]>) -> RepoResult<usize> {
        let deleted = match badge_ids {
            None => self.conn.execute("DELETE FROM awards;", [])?,
            Some([]) => 0,
            Some(ids) => {
                let tx = self.conn.unchecked_transaction()?;
                let mut deleted = 0;
                for chunk in ids.chunks(MAX_IN_BINDS) {
                    let sql = format!(
                        "DELETE FROM awards WHERE badge_id IN ({});",
                        placeholders(chunk.len())
                    );
                    let binds = chunk.iter().map(|id| Value::Integer(*id));
                    deleted += tx.execute(&sql, params_from_iter(binds))?;
                }
                tx.commit()?;
                deleted
            }
        };
        Ok(deleted)
    }
}

fn parse_award_row(row: &Row<'_>) -> rusqlite::Result<Award> {
    Ok(Award {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        badge_id: row.get("badge_id")?,
        awarded_at: row.get("awarded_at")?,
    })
}
