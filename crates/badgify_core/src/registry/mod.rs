//! Recipe registry and synchronization engine.
//!
//! # Responsibility
//! - Own the slug -> recipe class catalog.
//! - Instantiate recipes on demand and partition slug filters.
//! - Reconcile badge rows (`syncdb`), cached award counts
//!   (`sync_users_count`) and awards (`sync_awards`) against the catalog.
//!
//! # Invariants
//! - Every registered class passed recipe validation.
//! - Registering an existing slug replaces the previous class.
//! - A `syncdb` failure for one recipe never aborts the others.
//! - Sync passes never delete awards.
//!
//! The registry holds no locks; callers serialize sync passes.

use crate::model::user::{User, UserId};
use crate::recipe::{RecipeClass, RecipeClasses, RecipeConfigError, RecipeInstance};
use crate::repo::award_repo::AwardRepository;
use crate::repo::badge_repo::BadgeRepository;
use crate::repo::user_repo::{UserListQuery, UserRepository};
use crate::repo::RepoError;
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

mod report;
mod selection;

pub use report::{AwardSyncReport, BadgeAwards, CountSyncReport, SyncDbReport, SyncFailure};
pub use selection::BadgeSelection;

/// Default number of award rows inserted per transaction.
pub const DEFAULT_AWARD_BATCH_SIZE: usize = 500;

/// Registry lookup and sync errors.
#[derive(Debug)]
pub enum RegistryError {
    /// No recipe is registered under this slug.
    BadgeNotFound(String),
    /// The recipe is registered but its badge row does not exist yet.
    BadgeRecordMissing(String),
    Config(RecipeConfigError),
    Repo(RepoError),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadgeNotFound(slug) => write!(f, "no recipe registered for badge `{slug}`"),
            Self::BadgeRecordMissing(slug) => {
                write!(f, "badge `{slug}` has no database record; run syncdb first")
            }
            Self::Config(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::BadgeNotFound(_) | Self::BadgeRecordMissing(_) => None,
        }
    }
}

impl From<RecipeConfigError> for RegistryError {
    fn from(value: RecipeConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RepoError> for RegistryError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Catalog of recipe classes keyed by slug, iterated in slug order.
///
/// Built once at startup and passed to whatever drives the sync passes.
#[derive(Debug, Clone)]
pub struct Registry {
    recipes: BTreeMap<String, RecipeClass>,
    award_batch_size: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            recipes: BTreeMap::new(),
            award_batch_size: DEFAULT_AWARD_BATCH_SIZE,
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many awards `sync_awards` inserts per transaction.
    ///
    /// Zero is treated as one.
    pub fn with_award_batch_size(mut self, batch_size: usize) -> Self {
        self.award_batch_size = batch_size.max(1);
        self
    }

    pub fn award_batch_size(&self) -> usize {
        self.award_batch_size
    }

    pub fn recipes(&self) -> &BTreeMap<String, RecipeClass> {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.recipes.contains_key(slug)
    }

    /// Registered slugs in iteration order.
    pub fn slugs(&self) -> Vec<String> {
        self.recipes.keys().cloned().collect()
    }

    /// Registers one class or a sequence of classes.
    ///
    /// Every class is validated before any is inserted, so a malformed entry
    /// leaves the registry untouched. A slug registered twice keeps the last
    /// class.
    pub fn register(&mut self, recipes: impl Into<RecipeClasses>) -> Result<(), RecipeConfigError> {
        let RecipeClasses(classes) = recipes.into();
        let validated = classes
            .into_iter()
            .map(|class| class.validate().map(|slug| (slug, class)))
            .collect::<Result<Vec<_>, _>>()?;

        for (slug, class) in validated {
            debug!(
                "event=recipe_register module=registry status=ok slug={} class={}",
                slug,
                class.class_name()
            );
            if self.recipes.insert(slug.clone(), class).is_some() {
                debug!("event=recipe_register module=registry status=replaced slug={slug}");
            }
        }
        Ok(())
    }

    /// Removes one class or a sequence of classes by slug.
    ///
    /// Absent slugs are ignored.
    pub fn unregister(&mut self, recipes: impl Into<RecipeClasses>) {
        let RecipeClasses(classes) = recipes.into();
        for class in classes {
            let recipe = class.instantiate();
            self.unregister_slug(recipe.slug());
        }
    }

    /// Removes a recipe by slug; returns whether it was registered.
    pub fn unregister_slug(&mut self, slug: &str) -> bool {
        let removed = self.recipes.remove(slug).is_some();
        if removed {
            debug!("event=recipe_unregister module=registry status=ok slug={slug}");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.recipes.clear();
    }

    /// Instantiates the recipe registered under `slug`.
    pub fn get_recipe_instance(&self, slug: &str) -> Result<RecipeInstance, RegistryError> {
        self.find_recipe_instance(slug)
            .ok_or_else(|| RegistryError::BadgeNotFound(slug.to_string()))
    }

    pub fn find_recipe_instance(&self, slug: &str) -> Option<RecipeInstance> {
        self.recipes.get(slug).map(RecipeInstance::from_class)
    }

    /// Validates and instantiates `class` without consulting the catalog.
    pub fn get_recipe_instance_from_class(
        &self,
        class: &RecipeClass,
    ) -> Result<RecipeInstance, RecipeConfigError> {
        class.validate()?;
        Ok(RecipeInstance::from_class(class))
    }

    /// Instantiates the selected recipes, silently dropping unknown slugs.
    pub fn get_recipe_instances<'a>(
        &self,
        badges: impl Into<BadgeSelection<'a>>,
    ) -> Vec<RecipeInstance> {
        self.get_recipe_instances_for_badges(badges).0
    }

    /// Partitions a selection into instantiated recipes and unknown slugs.
    ///
    /// Repeated slugs are resolved once; order follows the selection, or
    /// slug order for `BadgeSelection::All`.
    pub fn get_recipe_instances_for_badges<'a>(
        &self,
        badges: impl Into<BadgeSelection<'a>>,
    ) -> (Vec<RecipeInstance>, Vec<String>) {
        let slugs = match badges.into() {
            BadgeSelection::All => {
                return (
                    self.recipes.values().map(RecipeInstance::from_class).collect(),
                    Vec::new(),
                )
            }
            BadgeSelection::Slugs(slugs) => slugs,
        };

        let mut seen = BTreeSet::new();
        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        for slug in slugs {
            if !seen.insert(slug) {
                continue;
            }
            match self.find_recipe_instance(slug) {
                Some(instance) => valid.push(instance),
                None => invalid.push(slug.to_string()),
            }
        }
        (valid, invalid)
    }

    /// Ensures every registered recipe has a badge row.
    ///
    /// Per-recipe storage failures are collected in `failed`; the pass always
    /// visits every recipe.
    pub fn syncdb(&self, badge_repo: &impl BadgeRepository) -> SyncDbReport {
        let started_at = Instant::now();
        let mut report = SyncDbReport::default();

        for instance in self.get_recipe_instances(BadgeSelection::All) {
            let slug = instance.slug().to_string();
            match badge_repo.get_or_create_badge(&slug, &instance.badge_defaults()) {
                Ok((badge, created)) => {
                    if created {
                        debug!("event=badge_create module=registry status=ok slug={slug}");
                        report.created.push(badge);
                    }
                }
                Err(error) => {
                    warn!(
                        "event=badge_create module=registry status=error slug={} error={}",
                        slug, error
                    );
                    report.failed.push(SyncFailure { slug, error });
                }
            }
        }

        info!(
            "event=syncdb module=registry status=ok recipes={} created={} failed={} duration_ms={}",
            self.len(),
            report.created.len(),
            report.failed.len(),
            started_at.elapsed().as_millis()
        );
        report
    }

    /// Recomputes each selected badge's award count and persists changes.
    ///
    /// # Errors
    /// - `BadgeRecordMissing` when a selected recipe has no badge row.
    /// - `Repo` on storage failure; earlier updates stay committed.
    pub fn sync_users_count<'a>(
        &self,
        badges: impl Into<BadgeSelection<'a>>,
        badge_repo: &impl BadgeRepository,
        award_repo: &impl AwardRepository,
    ) -> Result<CountSyncReport, RegistryError> {
        let started_at = Instant::now();
        let mut report = CountSyncReport::default();

        for instance in self.get_recipe_instances(badges) {
            let mut badge = instance.badge(badge_repo)?.clone();
            let users_count = award_repo.count_awards_for_badge(badge.id)?;
            if users_count == badge.users_count {
                report.unchanged.push(badge);
                continue;
            }

            badge_repo.update_users_count(badge.id, users_count)?;
            debug!(
                "event=users_count_update module=registry status=ok slug={} previous={} current={}",
                badge.slug, badge.users_count, users_count
            );
            badge.users_count = users_count;
            report.updated.push(badge);
        }

        info!(
            "event=sync_users_count module=registry status=ok updated={} unchanged={} duration_ms={}",
            report.updated.len(),
            report.unchanged.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Awards each selected badge to every candidate user that qualifies and
    /// does not hold it yet.
    ///
    /// Candidates are loaded once per pass; re-running with unchanged
    /// eligibility creates nothing.
    ///
    /// # Errors
    /// - `BadgeRecordMissing` when a selected recipe has no badge row.
    /// - `Repo` on storage failure; awards from completed batches stay.
    pub fn sync_awards<'a>(
        &self,
        badges: impl Into<BadgeSelection<'a>>,
        users: &UserListQuery,
        badge_repo: &impl BadgeRepository,
        award_repo: &impl AwardRepository,
        user_repo: &impl UserRepository,
    ) -> Result<AwardSyncReport, RegistryError> {
        let started_at = Instant::now();
        let instances = self.get_recipe_instances(badges);
        let candidates = user_repo.list_users(users)?;
        let mut report = AwardSyncReport::default();

        for instance in &instances {
            let badge = instance.badge(badge_repo)?.clone();
            let already_awarded = award_repo.list_awarded_user_ids(badge.id)?;
            let eligible = eligible_user_ids(instance, &candidates, &already_awarded);

            let user_ids = if eligible.is_empty() {
                Vec::new()
            } else {
                award_repo.create_awards(badge.id, &eligible, self.award_batch_size)?
            };

            debug!(
                "event=award_create module=registry status=ok slug={} candidates={} awarded={}",
                badge.slug,
                candidates.len(),
                user_ids.len()
            );
            if user_ids.is_empty() {
                report.unchanged.push(badge);
            } else {
                report.updated.push(BadgeAwards { badge, user_ids });
            }
        }

        info!(
            "event=sync_awards module=registry status=ok recipes={} users={} awarded={} duration_ms={}",
            instances.len(),
            candidates.len(),
            report.awarded_count(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}

fn eligible_user_ids(
    instance: &RecipeInstance,
    candidates: &[User],
    already_awarded: &BTreeSet<UserId>,
) -> Vec<UserId> {
    candidates
        .iter()
        .filter(|user| !already_awarded.contains(&user.id))
        .filter(|user| instance.is_eligible(user))
        .map(|user| user.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{BadgeSelection, Registry, RegistryError};
    use crate::model::badge::{Badge, BadgeDefaults, BadgeId};
    use crate::model::user::User;
    use crate::recipe::{Recipe, RecipeBuilder, RecipeClass, RecipeConfigError};
    use crate::repo::badge_repo::BadgeRepository;
    use crate::repo::{RepoError, RepoResult};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recipe1;

    impl Recipe for Recipe1 {
        fn slug(&self) -> &str {
            "recipe1"
        }

        fn is_eligible(&self, user: &User) -> bool {
            user.is_staff
        }
    }

    #[derive(Default)]
    struct Recipe2;

    impl Recipe for Recipe2 {
        fn slug(&self) -> &str {
            "recipe2"
        }

        fn is_eligible(&self, _user: &User) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct BadRecipe;

    impl Recipe for BadRecipe {
        fn slug(&self) -> &str {
            ""
        }

        fn is_eligible(&self, _user: &User) -> bool {
            true
        }
    }

    /// In-memory badge store that refuses one slug.
    #[derive(Default)]
    struct FlakyBadgeRepo {
        rows: RefCell<Vec<Badge>>,
        broken_slug: &'static str,
    }

    impl BadgeRepository for FlakyBadgeRepo {
        fn get_badge_by_slug(&self, slug: &str) -> RepoResult<Option<Badge>> {
            Ok(self.rows.borrow().iter().find(|b| b.slug == slug).cloned())
        }

        fn get_or_create_badge(
            &self,
            slug: &str,
            defaults: &BadgeDefaults,
        ) -> RepoResult<(Badge, bool)> {
            if slug == self.broken_slug {
                return Err(RepoError::InvalidData(format!("refused {slug}")));
            }
            if let Some(existing) = self.get_badge_by_slug(slug)? {
                return Ok((existing, false));
            }
            let badge = Badge {
                id: self.rows.borrow().len() as BadgeId + 1,
                slug: slug.to_string(),
                name: defaults.name.clone(),
                description: defaults.description.clone(),
                points: defaults.points,
                users_count: 0,
                created_at: 0,
            };
            self.rows.borrow_mut().push(badge.clone());
            Ok((badge, true))
        }

        fn list_badges(&self) -> RepoResult<Vec<Badge>> {
            Ok(self.rows.borrow().clone())
        }

        fn update_users_count(&self, id: BadgeId, users_count: i64) -> RepoResult<()> {
            let mut rows = self.rows.borrow_mut();
            let badge = rows
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| RepoError::not_found("badge", id))?;
            badge.users_count = users_count;
            Ok(())
        }
    }

    #[test]
    fn register_accepts_single_class_and_lists() {
        let mut registry = Registry::new();
        registry.register(RecipeClass::of::<Recipe1>()).unwrap();
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
        registry
            .register([RecipeClass::of::<Recipe1>(), RecipeClass::of::<Recipe2>()])
            .unwrap();
        assert_eq!(registry.slugs(), vec!["recipe1", "recipe2"]);
    }

    #[test]
    fn register_rejects_bad_recipe_without_partial_insert() {
        let mut registry = Registry::new();
        let err = registry
            .register(vec![RecipeClass::of::<Recipe1>(), RecipeClass::of::<BadRecipe>()])
            .unwrap_err();
        assert!(matches!(err, RecipeConfigError::MissingMembers { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn register_same_slug_keeps_last_class() {
        let mut registry = Registry::new();
        registry.register(RecipeClass::of::<Recipe1>()).unwrap();
        let replacement = RecipeBuilder::new("recipe1")
            .class_name("Replacement")
            .eligible_when(|_| true)
            .build()
            .unwrap();
        registry.register(replacement).unwrap();

        assert_eq!(registry.len(), 1);
        let instance = registry.get_recipe_instance("recipe1").unwrap();
        assert_eq!(instance.class_name(), "Replacement");
    }

    #[test]
    fn unregister_removes_and_ignores_absent() {
        let mut registry = Registry::new();
        registry.register(RecipeClass::of::<Recipe1>()).unwrap();
        registry.unregister(RecipeClass::of::<Recipe1>());
        registry.unregister(RecipeClass::of::<Recipe2>());
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get_recipe_instance("recipe1"),
            Err(RegistryError::BadgeNotFound(slug)) if slug == "recipe1"
        ));
        assert!(!registry.unregister_slug("recipe1"));
    }

    #[test]
    fn instance_from_class_validates() {
        let registry = Registry::new();
        let instance = registry
            .get_recipe_instance_from_class(&RecipeClass::of::<Recipe1>())
            .unwrap();
        assert_eq!(instance.class_name(), "Recipe1");
        assert!(registry
            .get_recipe_instance_from_class(&RecipeClass::of::<BadRecipe>())
            .is_err());
    }

    #[test]
    fn partition_deduplicates_and_keeps_selection_order() {
        let mut registry = Registry::new();
        registry
            .register([RecipeClass::of::<Recipe1>(), RecipeClass::of::<Recipe2>()])
            .unwrap();

        let (valid, invalid) =
            registry.get_recipe_instances_for_badges(["recipe2", "oops", "recipe1", "recipe2"]);
        let slugs: Vec<&str> = valid.iter().map(|instance| instance.slug()).collect();
        assert_eq!(slugs, vec!["recipe2", "recipe1"]);
        assert_eq!(invalid, vec!["oops"]);

        let (valid, invalid) = registry.get_recipe_instances_for_badges(BadgeSelection::All);
        assert_eq!(valid.len(), 2);
        assert!(invalid.is_empty());
    }

    #[test]
    fn syncdb_isolates_per_recipe_failures() {
        let mut registry = Registry::new();
        registry
            .register([RecipeClass::of::<Recipe1>(), RecipeClass::of::<Recipe2>()])
            .unwrap();
        let repo = FlakyBadgeRepo {
            broken_slug: "recipe1",
            ..FlakyBadgeRepo::default()
        };

        let (created, failed) = registry.syncdb(&repo).into_parts();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].slug, "recipe2");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].slug, "recipe1");
        assert!(matches!(failed[0].error, RepoError::InvalidData(_)));
    }

    #[test]
    fn badge_accessor_fails_before_syncdb_and_caches_after() {
        let mut registry = Registry::new();
        registry.register(RecipeClass::of::<Recipe2>()).unwrap();
        let repo = FlakyBadgeRepo::default();

        let instance = registry.get_recipe_instance("recipe2").unwrap();
        assert!(matches!(
            instance.badge(&repo),
            Err(RegistryError::BadgeRecordMissing(slug)) if slug == "recipe2"
        ));
        assert!(instance.cached_badge().is_none());

        registry.syncdb(&repo);
        let badge = instance.badge(&repo).unwrap();
        assert_eq!(badge.slug, "recipe2");
        assert_eq!(badge.name, "Recipe2");
        assert!(instance.cached_badge().is_some());
    }

    #[test]
    fn register_accepts_separator_only_slug() {
        let mut registry = Registry::new();
        let class = RecipeBuilder::new("_")
            .eligible_when(|_: &User| true)
            .build()
            .unwrap();
        registry.register(class).unwrap();

        let instance = registry.get_recipe_instance("_").unwrap();
        assert_eq!(instance.name(), "_");
        assert_eq!(instance.description(), "_");
    }

    #[test]
    fn award_batch_size_is_at_least_one() {
        assert_eq!(Registry::new().with_award_batch_size(0).award_batch_size(), 1);
        assert_eq!(Registry::new().award_batch_size(), super::DEFAULT_AWARD_BATCH_SIZE);
    }
}
