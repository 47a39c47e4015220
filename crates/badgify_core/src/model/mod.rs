//! Persisted records of the badge registry.
//!
//! # Responsibility
//! - Define the badge, award and user shapes shared by repositories,
//!   registry sync passes and query helpers.
//!
//! # Invariants
//! - Exactly one `Badge` exists per registered recipe slug after `syncdb`.
//! - At most one `Award` exists per `(user_id, badge_id)` pair.

pub mod award;
pub mod badge;
pub mod user;
