//! Use-case services built on the registry and repositories.
//!
//! # Responsibility
//! - Answer presentation-layer badge queries.
//! - Drive ordered sync passes for schedulers and the CLI.

pub mod badge_service;
pub mod sync_service;
