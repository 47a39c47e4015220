//! Closure-based recipes declared at runtime.
//!
//! Trait implementors get `slug`/`is_eligible` checked by the compiler; a
//! builder can be left incomplete, so `build()` reports every missing member
//! at once.

use super::{validate_recipe, Recipe, RecipeClass, RecipeConfigError};
use crate::model::user::User;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&User) -> bool + Send + Sync>;

/// Recipe produced by `RecipeBuilder`.
#[derive(Clone)]
pub struct DeclaredRecipe {
    slug: String,
    name: Option<String>,
    description: Option<String>,
    points: i64,
    predicate: Predicate,
}

impl Recipe for DeclaredRecipe {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => super::humanize_slug(&self.slug),
        }
    }

    fn description(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => self.name(),
        }
    }

    fn points(&self) -> i64 {
        self.points
    }

    fn is_eligible(&self, user: &User) -> bool {
        (self.predicate)(user)
    }
}

/// Declares a recipe without a dedicated type.
///
/// ```
/// use badgify_core::RecipeBuilder;
///
/// let class = RecipeBuilder::new("staff")
///     .name("Staff")
///     .eligible_when(|user| user.is_staff)
///     .build()
///     .unwrap();
/// assert_eq!(class.validate().unwrap(), "staff");
/// ```
#[derive(Default)]
pub struct RecipeBuilder {
    class_name: Option<String>,
    slug: Option<String>,
    name: Option<String>,
    description: Option<String>,
    points: i64,
    predicate: Option<Predicate>,
}

impl RecipeBuilder {
    pub fn new(slug: impl Into<String>) -> Self {
        Self::default().slug(slug)
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Name used in diagnostics; defaults to `declared:<slug>`.
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    pub fn eligible_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&User) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Validates the declaration and wraps it into a registrable class.
    pub fn build(self) -> Result<RecipeClass, RecipeConfigError> {
        let slug = self.slug.filter(|slug| !slug.is_empty());
        let class_name = self.class_name.unwrap_or_else(|| match &slug {
            Some(slug) => format!("declared:{slug}"),
            None => "declared".to_string(),
        });

        let mut missing = Vec::new();
        if slug.is_none() {
            missing.push("slug");
        }
        if self.predicate.is_none() {
            missing.push("is_eligible");
        }
        let (Some(slug), Some(predicate)) = (slug, self.predicate) else {
            return Err(RecipeConfigError::MissingMembers {
                recipe: class_name,
                missing,
            });
        };

        let recipe = DeclaredRecipe {
            slug,
            name: self.name,
            description: self.description,
            points: self.points,
            predicate,
        };
        validate_recipe(&class_name, &recipe)?;

        Ok(RecipeClass::from_fn(class_name, move || recipe.clone()))
    }
}
