//! Minimal user model consumed by recipe predicates.
//!
//! # Invariants
//! - `username` is unique and non-blank.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type UserId = i64;

/// Application user as seen by recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
    /// Unix epoch milliseconds.
    pub date_joined: i64,
}

/// Insert payload for a new user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
}

impl NewUser {
    /// Creates an active, non-staff user payload.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            is_active: true,
            is_staff: false,
        }
    }

    /// Marks the user as staff.
    pub fn staff(mut self) -> Self {
        self.is_staff = true;
        self
    }

    /// Marks the user as inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Checks invariants enforced before persistence.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.username.trim().is_empty() {
            return Err(UserValidationError::BlankUsername);
        }
        if self.username.trim() != self.username {
            return Err(UserValidationError::UntrimmedUsername(self.username.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    BlankUsername,
    UntrimmedUsername(String),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUsername => write!(f, "username must not be blank"),
            Self::UntrimmedUsername(value) => {
                write!(f, "username must not carry surrounding whitespace: `{value}`")
            }
        }
    }
}

impl Error for UserValidationError {}

#[cfg(test)]
mod tests {
    use super::{NewUser, UserValidationError};

    #[test]
    fn builder_flags_apply() {
        let user = NewUser::new("ada", "ada@example.com").staff().inactive();
        assert!(user.is_staff);
        assert!(!user.is_active);
    }

    #[test]
    fn validate_rejects_blank_and_padded_usernames() {
        assert_eq!(
            NewUser::new("  ", "").validate(),
            Err(UserValidationError::BlankUsername)
        );
        assert!(matches!(
            NewUser::new(" ada", "").validate(),
            Err(UserValidationError::UntrimmedUsername(_))
        ));
        assert!(NewUser::new("ada", "").validate().is_ok());
    }
}
