//! Read path used by templates and views to list badges.
//!
//! # Invariants
//! - An unknown username degrades to "no user" instead of failing.
//! - Awarded badges are ordered by award time; all badges by creation.

use crate::model::badge::Badge;
use crate::model::user::UserId;
use crate::repo::award_repo::AwardRepository;
use crate::repo::badge_repo::BadgeRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoResult;
use log::debug;

/// Who to list badges for.
///
/// A resolvable `username` wins over `user`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeLookup {
    pub user: Option<UserId>,
    pub username: Option<String>,
}

impl BadgeLookup {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_user(user: UserId) -> Self {
        Self {
            user: Some(user),
            username: None,
        }
    }

    pub fn for_username(username: impl Into<String>) -> Self {
        Self {
            user: None,
            username: Some(username.into()),
        }
    }
}

/// Badge listing service.
pub struct BadgeService<B, A, U> {
    badges: B,
    awards: A,
    users: U,
}

impl<B: BadgeRepository, A: AwardRepository, U: UserRepository> BadgeService<B, A, U> {
    pub fn new(badges: B, awards: A, users: U) -> Self {
        Self {
            badges,
            awards,
            users,
        }
    }

    /// Returns the badges awarded to the looked-up user, or every badge when
    /// no user resolves.
    pub fn badges_for(&self, lookup: &BadgeLookup) -> RepoResult<Vec<Badge>> {
        let user = match lookup.username.as_deref().filter(|name| !name.is_empty()) {
            Some(username) => match self.users.get_user_by_username(username)? {
                Some(found) => Some(found.id),
                None => {
                    debug!("event=badge_lookup module=service status=user_missing");
                    lookup.user
                }
            },
            None => lookup.user,
        };

        match user {
            Some(user_id) => self.awards.list_badges_for_user(user_id),
            None => self.badges.list_badges(),
        }
    }
}
