//! Storage contracts and SQLite implementations for badges, awards and users.
//!
//! # Responsibility
//! - Define the persistence operations the registry sync passes rely on.
//! - Keep SQL inside the core persistence boundary.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `InvalidData`) in
//!   addition to DB transport errors.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::user::UserValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod award_repo;
pub mod badge_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for badge store operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(UserValidationError),
    Db(DbError),
    NotFound { entity: &'static str, key: String },
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Upper bound of binds per `IN (...)` list; stays well under
/// `SQLITE_MAX_VARIABLE_NUMBER` on older builds (999).
pub(crate) const MAX_IN_BINDS: usize = 500;

/// Builds `?, ?, ?` for an `IN (...)` clause with `count` binds.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
