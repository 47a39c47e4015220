//! SQLite storage bootstrap for badge, award and user tables.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the badge registry.
//! - Apply schema migrations before any repository touches the data.
//!
//! # Tables
//! - `users`: candidate population for recipe evaluation.
//! - `badges`: one row per registered recipe slug, with the cached
//!   `users_count`.
//! - `awards`: `(user_id, badge_id)` pairs, unique, cascading on delete of
//!   either side.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Sync passes must only run against a fully migrated connection.
//!
//! # See also
//! - `crate::repo` for the typed access layer over these tables.
//! - `migrations` for the schema history.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage transport and schema errors.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A migration step failed; the whole upgrade was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "badge database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "badge schema migration {version} ({name}) failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Migration { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
