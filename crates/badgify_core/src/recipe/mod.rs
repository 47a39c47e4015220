//! Recipe contract: badge identity plus an eligibility predicate.
//!
//! # Responsibility
//! - Define the `Recipe` trait application code implements.
//! - Wrap recipe types into factories (`RecipeClass`) the registry can
//!   instantiate on demand.
//! - Validate recipe identity before it reaches the registry.
//!
//! # Invariants
//! - A valid slug is non-empty and matches `[-a-zA-Z0-9_]+`.
//! - A recipe instance caches at most one badge row, resolved lazily.

use crate::model::badge::{Badge, BadgeDefaults};
use crate::model::user::User;
use crate::registry::RegistryError;
use crate::repo::badge_repo::BadgeRepository;
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

mod builder;

pub use builder::{DeclaredRecipe, RecipeBuilder};

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

/// Eligibility rule for one badge.
///
/// Only `slug` and `is_eligible` are required; display fields derive from the
/// slug when not overridden.
pub trait Recipe {
    /// Unique badge key.
    fn slug(&self) -> &str;

    fn name(&self) -> String {
        humanize_slug(self.slug())
    }

    fn description(&self) -> String {
        self.name()
    }

    fn points(&self) -> i64 {
        0
    }

    /// Pure predicate: does `user` qualify for this badge.
    fn is_eligible(&self, user: &User) -> bool;
}

type RecipeFactory = dyn Fn() -> Box<dyn Recipe> + Send + Sync;

/// Named factory producing fresh recipe instances.
#[derive(Clone)]
pub struct RecipeClass {
    class_name: String,
    factory: Arc<RecipeFactory>,
}

impl RecipeClass {
    /// Class for a recipe type constructed through `Default`.
    pub fn of<R: Recipe + Default + 'static>() -> Self {
        Self {
            class_name: short_type_name::<R>().to_string(),
            factory: Arc::new(|| Box::new(R::default()) as Box<dyn Recipe>),
        }
    }

    /// Class backed by an arbitrary constructor.
    pub fn from_fn<R, F>(class_name: impl Into<String>, factory: F) -> Self
    where
        R: Recipe + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            class_name: class_name.into(),
            factory: Arc::new(move || Box::new(factory()) as Box<dyn Recipe>),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Builds a new, unvalidated recipe value.
    pub fn instantiate(&self) -> Box<dyn Recipe> {
        (self.factory)()
    }

    /// Instantiates once and checks the recipe identity.
    ///
    /// Returns the validated slug.
    pub fn validate(&self) -> Result<String, RecipeConfigError> {
        let recipe = self.instantiate();
        validate_recipe(&self.class_name, recipe.as_ref())?;
        Ok(recipe.slug().to_string())
    }
}

impl Debug for RecipeClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeClass")
            .field("class_name", &self.class_name)
            .finish_non_exhaustive()
    }
}

/// One or more recipe classes passed to `register`/`unregister`.
#[derive(Debug, Clone, Default)]
pub struct RecipeClasses(pub Vec<RecipeClass>);

impl From<RecipeClass> for RecipeClasses {
    fn from(value: RecipeClass) -> Self {
        Self(vec![value])
    }
}

impl From<&RecipeClass> for RecipeClasses {
    fn from(value: &RecipeClass) -> Self {
        Self(vec![value.clone()])
    }
}

impl From<Vec<RecipeClass>> for RecipeClasses {
    fn from(value: Vec<RecipeClass>) -> Self {
        Self(value)
    }
}

impl From<&[RecipeClass]> for RecipeClasses {
    fn from(value: &[RecipeClass]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<[RecipeClass; N]> for RecipeClasses {
    fn from(value: [RecipeClass; N]) -> Self {
        Self(value.into())
    }
}

/// Live recipe created by the registry for one sync pass or lookup.
pub struct RecipeInstance {
    class_name: String,
    recipe: Box<dyn Recipe>,
    badge: OnceCell<Badge>,
}

impl RecipeInstance {
    pub(crate) fn from_class(class: &RecipeClass) -> Self {
        Self {
            class_name: class.class_name.clone(),
            recipe: class.instantiate(),
            badge: OnceCell::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn slug(&self) -> &str {
        self.recipe.slug()
    }

    pub fn name(&self) -> String {
        self.recipe.name()
    }

    pub fn description(&self) -> String {
        self.recipe.description()
    }

    pub fn points(&self) -> i64 {
        self.recipe.points()
    }

    pub fn is_eligible(&self, user: &User) -> bool {
        self.recipe.is_eligible(user)
    }

    /// Values used when `syncdb` has to create this recipe's badge.
    pub fn badge_defaults(&self) -> BadgeDefaults {
        BadgeDefaults {
            name: self.name(),
            description: self.description(),
            points: self.points(),
        }
    }

    /// Resolves the persisted badge for this recipe, caching it.
    ///
    /// # Errors
    /// - `RegistryError::BadgeRecordMissing` before `syncdb` created the row.
    /// - `RegistryError::Repo` on storage failure; nothing is cached then.
    pub fn badge(&self, repo: &impl BadgeRepository) -> Result<&Badge, RegistryError> {
        self.badge.get_or_try_init(|| {
            repo.get_badge_by_slug(self.slug())?
                .ok_or_else(|| RegistryError::BadgeRecordMissing(self.slug().to_string()))
        })
    }

    /// Returns the cached badge without touching storage.
    pub fn cached_badge(&self) -> Option<&Badge> {
        self.badge.get()
    }

}

impl Debug for RecipeInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeInstance")
            .field("class_name", &self.class_name)
            .field("slug", &self.slug())
            .field("badge", &self.badge.get())
            .finish()
    }
}

/// Malformed recipe definition. A programming error, not a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeConfigError {
    MissingMembers {
        recipe: String,
        missing: Vec<&'static str>,
    },
    InvalidSlug {
        recipe: String,
        slug: String,
    },
    BlankName {
        recipe: String,
        slug: String,
    },
}

impl Display for RecipeConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingMembers { recipe, missing } => write!(
                f,
                "recipe `{recipe}` is missing required members: {}",
                missing.join(", ")
            ),
            Self::InvalidSlug { recipe, slug } => write!(
                f,
                "recipe `{recipe}` has invalid slug `{slug}`; expected [-a-zA-Z0-9_]+"
            ),
            Self::BlankName { recipe, slug } => {
                write!(f, "recipe `{recipe}` (slug `{slug}`) has a blank name")
            }
        }
    }
}

impl Error for RecipeConfigError {}

/// Checks identity invariants of one recipe value.
pub fn validate_recipe(class_name: &str, recipe: &dyn Recipe) -> Result<(), RecipeConfigError> {
    let slug = recipe.slug();
    if slug.is_empty() {
        return Err(RecipeConfigError::MissingMembers {
            recipe: class_name.to_string(),
            missing: vec!["slug"],
        });
    }
    if !is_valid_slug(slug) {
        return Err(RecipeConfigError::InvalidSlug {
            recipe: class_name.to_string(),
            slug: slug.to_string(),
        });
    }
    if recipe.name().trim().is_empty() {
        return Err(RecipeConfigError::BlankName {
            recipe: class_name.to_string(),
            slug: slug.to_string(),
        });
    }
    Ok(())
}

pub fn is_valid_slug(value: &str) -> bool {
    SLUG_RE.is_match(value)
}

/// `"love-python"` -> `"Love python"`.
///
/// A slug made only of separators (`"_"`, `"--"`) is returned as is.
pub fn humanize_slug(slug: &str) -> String {
    let spaced = slug.replace(['-', '_'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => slug.to_string(),
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    strip_type_path(std::any::type_name::<T>())
}

/// `app::Wrap<app::Inner>` -> `Wrap`.
fn strip_type_path(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
