//! Runtime settings for sync drivers.
//!
//! # Invariants
//! - `db_path` is non-blank.
//! - `log_level` is one of `trace|debug|info|warn|error`.
//! - `log_dir`, when set, is absolute.
//! - `award_batch_size` is at least one.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use crate::registry::{Registry, DEFAULT_AWARD_BATCH_SIZE};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Validated driver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
    pub award_batch_size: usize,
}

/// Raw, unvalidated settings as supplied by a CLI or host application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSettings {
    pub db_path: String,
    pub log_level: Option<String>,
    pub log_dir: Option<String>,
    pub award_batch_size: Option<usize>,
}

impl Settings {
    pub fn from_raw(raw: &RawSettings) -> Result<Self, SettingsError> {
        let db_path = raw.db_path.trim();
        if db_path.is_empty() {
            return Err(SettingsError::EmptyDbPath);
        }

        let log_level = match raw.log_level.as_deref() {
            Some(level) => normalize_level(level).map_err(SettingsError::LogLevel)?,
            None => default_log_level(),
        };

        let log_dir = raw
            .log_dir
            .as_deref()
            .map(normalize_log_dir)
            .transpose()
            .map_err(SettingsError::LogDir)?;

        let award_batch_size = raw.award_batch_size.unwrap_or(DEFAULT_AWARD_BATCH_SIZE);
        if award_batch_size == 0 {
            return Err(SettingsError::ZeroBatchSize);
        }

        Ok(Self {
            db_path: PathBuf::from(db_path),
            log_level,
            log_dir,
            award_batch_size,
        })
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when logging is disabled.
    pub fn init_logging(&self) -> Result<bool, SettingsError> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(false);
        };
        crate::logging::init_logging(self.log_level, &log_dir.to_string_lossy())
            .map_err(SettingsError::LogInit)?;
        Ok(true)
    }

    /// Empty registry carrying these sync options.
    pub fn registry(&self) -> Registry {
        Registry::new().with_award_batch_size(self.award_batch_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    EmptyDbPath,
    LogLevel(String),
    LogDir(String),
    LogInit(String),
    ZeroBatchSize,
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDbPath => write!(f, "database path must not be empty"),
            Self::LogLevel(message) | Self::LogDir(message) => write!(f, "{message}"),
            Self::LogInit(message) => write!(f, "failed to initialize logging: {message}"),
            Self::ZeroBatchSize => write!(f, "award batch size must be at least 1"),
        }
    }
}

impl Error for SettingsError {}
