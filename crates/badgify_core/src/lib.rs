//! Badge registry core.
//!
//! Applications declare recipes (badge identity plus an eligibility
//! predicate), register them in a [`Registry`] and periodically run the sync
//! passes that create badge rows, award qualifying users and refresh cached
//! award counts.

pub mod db;
pub mod logging;
pub mod model;
pub mod recipe;
pub mod registry;
pub mod repo;
pub mod service;
pub mod settings;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::award::{Award, AwardId};
pub use model::badge::{Badge, BadgeDefaults, BadgeId};
pub use model::user::{NewUser, User, UserId, UserValidationError};
pub use recipe::{
    DeclaredRecipe, Recipe, RecipeBuilder, RecipeClass, RecipeClasses, RecipeConfigError,
    RecipeInstance,
};
pub use registry::{
    AwardSyncReport, BadgeAwards, BadgeSelection, CountSyncReport, Registry, RegistryError,
    SyncDbReport, SyncFailure, DEFAULT_AWARD_BATCH_SIZE,
};
pub use repo::award_repo::{AwardRepository, SqliteAwardRepository};
pub use repo::badge_repo::{BadgeRepository, SqliteBadgeRepository};
pub use repo::user_repo::{SqliteUserRepository, UserListQuery, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::badge_service::{BadgeLookup, BadgeService};
pub use service::sync_service::{FullSyncReport, ResetReport, SyncService};
pub use settings::{RawSettings, Settings, SettingsError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
