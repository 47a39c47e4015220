//! Built-in recipes registered by the `badgify` binary.

use badgify_core::{Recipe, RecipeClass, User};

/// Every active account.
#[derive(Default)]
pub struct Joined;

impl Recipe for Joined {
    fn slug(&self) -> &str {
        "joined"
    }

    fn description(&self) -> String {
        "Has an active account".to_string()
    }

    fn points(&self) -> i64 {
        1
    }

    fn is_eligible(&self, user: &User) -> bool {
        user.is_active
    }
}

#[derive(Default)]
pub struct Staff;

impl Recipe for Staff {
    fn slug(&self) -> &str {
        "staff"
    }

    fn description(&self) -> String {
        "Member of the staff".to_string()
    }

    fn points(&self) -> i64 {
        10
    }

    fn is_eligible(&self, user: &User) -> bool {
        user.is_active && user.is_staff
    }
}

/// Users with a python.org address.
#[derive(Default)]
pub struct PythonLover;

impl Recipe for PythonLover {
    fn slug(&self) -> &str {
        "python-lover"
    }

    fn points(&self) -> i64 {
        5
    }

    fn is_eligible(&self, user: &User) -> bool {
        user.email.to_ascii_lowercase().ends_with("@python.org")
    }
}

pub fn builtin() -> Vec<RecipeClass> {
    vec![
        RecipeClass::of::<Joined>(),
        RecipeClass::of::<Staff>(),
        RecipeClass::of::<PythonLover>(),
    ]
}
