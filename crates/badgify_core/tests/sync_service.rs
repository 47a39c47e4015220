use badgify_core::db::open_db_in_memory;
use badgify_core::{
    AwardRepository, BadgeRepository, BadgeSelection, NewUser, RecipeBuilder, RecipeClass,
    Registry, SqliteAwardRepository, SqliteBadgeRepository, SqliteUserRepository, SyncService,
    UserListQuery, UserRepository,
};

fn staff_recipe() -> RecipeClass {
    RecipeBuilder::new("staff")
        .eligible_when(|user| user.is_staff)
        .build()
        .unwrap()
}

fn everyone_recipe() -> RecipeClass {
    RecipeBuilder::new("joined")
        .name("Joined")
        .points(1)
        .eligible_when(|user| user.is_active)
        .build()
        .unwrap()
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(vec![staff_recipe(), everyone_recipe()])
        .unwrap();
    registry
}

#[test]
fn sync_all_converges_fresh_database() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);
    users
        .create_user(&NewUser::new("ada", "ada@example.com").staff())
        .unwrap();
    users
        .create_user(&NewUser::new("bob", "bob@example.com"))
        .unwrap();
    let registry = registry();
    let service = SyncService::sqlite(&registry, &conn);

    let report = service.sync_all(BadgeSelection::All).unwrap();
    assert_eq!(report.badges.created.len(), 2);
    assert_eq!(report.awards.awarded_count(), 3);
    assert_eq!(report.counts.updated.len(), 2);

    let badges = SqliteBadgeRepository::new(&conn);
    assert_eq!(
        badges.get_badge_by_slug("joined").unwrap().unwrap().users_count,
        2
    );
    assert_eq!(
        badges.get_badge_by_slug("staff").unwrap().unwrap().users_count,
        1
    );

    let second = service.sync_all(BadgeSelection::All).unwrap();
    assert!(second.badges.created.is_empty());
    assert_eq!(second.awards.awarded_count(), 0);
    assert!(second.counts.updated.is_empty());
}

#[test]
fn sync_all_selection_limits_award_and_count_passes() {
    let conn = open_db_in_memory().unwrap();
    SqliteUserRepository::new(&conn)
        .create_user(&NewUser::new("ada", "").staff())
        .unwrap();
    let registry = registry();
    let service = SyncService::sqlite(&registry, &conn);

    let report = service.sync_all("staff").unwrap();
    assert_eq!(report.badges.created.len(), 2);
    assert_eq!(report.awards.updated.len(), 1);
    assert_eq!(report.awards.updated[0].badge.slug, "staff");
    assert_eq!(report.counts.updated.len(), 1);
}

#[test]
fn reset_awards_clears_selected_badges_and_counts() {
    let conn = open_db_in_memory().unwrap();
    SqliteUserRepository::new(&conn)
        .create_user(&NewUser::new("ada", "").staff())
        .unwrap();
    let registry = registry();
    let service = SyncService::sqlite(&registry, &conn);
    service.sync_all(BadgeSelection::All).unwrap();

    let reset = service.reset_awards(["staff", "unknown"]).unwrap();
    assert_eq!(reset.deleted_awards, 1);
    assert_eq!(reset.counts.updated.len(), 1);
    assert_eq!(reset.counts.updated[0].users_count, 0);

    let badges = SqliteBadgeRepository::new(&conn);
    let awards = SqliteAwardRepository::new(&conn);
    let joined = badges.get_badge_by_slug("joined").unwrap().unwrap();
    assert_eq!(joined.users_count, 1);
    assert_eq!(awards.count_awards_for_badge(joined.id).unwrap(), 1);

    let reset = service.reset_awards(BadgeSelection::All).unwrap();
    assert_eq!(reset.deleted_awards, 1);
}

#[test]
fn reset_before_syncdb_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry();
    let service = SyncService::sqlite(&registry, &conn);

    let reset = service.reset_awards(BadgeSelection::All).unwrap();
    assert_eq!(reset.deleted_awards, 0);
    assert!(reset.counts.updated.is_empty());
    assert!(reset.counts.unchanged.is_empty());
}

#[test]
fn sync_awards_honors_user_query() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);
    let ada = users.create_user(&NewUser::new("ada", "")).unwrap();
    users
        .create_user(&NewUser::new("bob", "").inactive())
        .unwrap();
    let registry = registry();
    let service = SyncService::sqlite(&registry, &conn);
    service.sync_badges();

    let report = service
        .sync_awards("joined", &UserListQuery::by_ids([ada.id]))
        .unwrap();
    assert_eq!(report.updated[0].user_ids, vec![ada.id]);
    assert_eq!(service.registry().len(), 2);
}
