use badgify_core::db::open_db_in_memory;
use badgify_core::{
    AwardRepository, BadgeDefaults, BadgeRepository, NewUser, RepoError, SqliteAwardRepository,
    SqliteBadgeRepository, SqliteUserRepository, UserListQuery, UserRepository,
};

fn defaults(name: &str) -> BadgeDefaults {
    BadgeDefaults {
        name: name.to_string(),
        description: format!("{name} badge"),
        points: 5,
    }
}

#[test]
fn get_or_create_badge_creates_once() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBadgeRepository::new(&conn);

    let (badge, created) = repo.get_or_create_badge("first", &defaults("First")).unwrap();
    assert!(created);
    assert_eq!(badge.name, "First");
    assert_eq!(badge.description, "First badge");
    assert_eq!(badge.points, 5);
    assert_eq!(badge.users_count, 0);

    let (again, created) = repo
        .get_or_create_badge("first", &defaults("Renamed"))
        .unwrap();
    assert!(!created);
    assert_eq!(again.id, badge.id);
    assert_eq!(again.name, "First");
    assert_eq!(repo.list_badges().unwrap().len(), 1);
}

#[test]
fn blank_badge_slug_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBadgeRepository::new(&conn);
    let err = repo.get_or_create_badge(" ", &defaults("Blank")).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn update_users_count_reports_missing_badge() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBadgeRepository::new(&conn);
    let err = repo.update_users_count(42, 1).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "badge", .. }));
}

#[test]
fn user_crud_and_filters() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let ada = repo
        .create_user(&NewUser::new("ada", "ada@example.com").staff())
        .unwrap();
    let bob = repo
        .create_user(&NewUser::new("bob", "bob@example.com").inactive())
        .unwrap();
    assert!(ada.is_staff);
    assert!(!bob.is_active);

    assert_eq!(
        repo.get_user_by_username("bob").unwrap().map(|u| u.id),
        Some(bob.id)
    );
    assert!(repo.get_user_by_username("carol").unwrap().is_none());

    assert_eq!(repo.list_users(&UserListQuery::default()).unwrap().len(), 2);
    let active = UserListQuery {
        active_only: true,
        ..UserListQuery::default()
    };
    assert_eq!(repo.list_users(&active).unwrap(), vec![ada.clone()]);
    assert_eq!(
        repo.list_users(&UserListQuery::by_usernames(["bob"])).unwrap(),
        vec![bob.clone()]
    );
    assert!(repo
        .list_users(&UserListQuery::by_ids(Vec::new()))
        .unwrap()
        .is_empty());

    let mut renamed = ada;
    renamed.email = "ada@python.org".to_string();
    repo.update_user(&renamed).unwrap();
    assert_eq!(
        repo.get_user(renamed.id).unwrap().unwrap().email,
        "ada@python.org"
    );
}

#[test]
fn create_user_validates_and_enforces_unique_username() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);

    let err = repo.create_user(&NewUser::new("", "")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    repo.create_user(&NewUser::new("ada", "")).unwrap();
    let err = repo.create_user(&NewUser::new("ada", "")).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn awards_are_idempotent_and_countable() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);
    let badges = SqliteBadgeRepository::new(&conn);
    let awards = SqliteAwardRepository::new(&conn);

    let ada = users.create_user(&NewUser::new("ada", "")).unwrap();
    let bob = users.create_user(&NewUser::new("bob", "")).unwrap();
    let (badge, _) = badges.get_or_create_badge("first", &defaults("First")).unwrap();

    let award = awards.create_award(ada.id, badge.id).unwrap().unwrap();
    assert_eq!(award.user_id, ada.id);
    assert!(awards.create_award(ada.id, badge.id).unwrap().is_none());

    let awarded = awards
        .create_awards(badge.id, &[ada.id, bob.id], 1)
        .unwrap();
    assert_eq!(awarded, vec![bob.id]);
    assert_eq!(awards.count_awards_for_badge(badge.id).unwrap(), 2);
    assert_eq!(
        awards
            .list_awarded_user_ids(badge.id)
            .unwrap()
            .into_iter()
            .collect::<Vec<_>>(),
        vec![ada.id, bob.id]
    );
    assert_eq!(awards.get_award(bob.id, badge.id).unwrap().unwrap().badge_id, badge.id);
}

#[test]
fn delete_awards_honors_badge_filter() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);
    let badges = SqliteBadgeRepository::new(&conn);
    let awards = SqliteAwardRepository::new(&conn);

    let ada = users.create_user(&NewUser::new("ada", "")).unwrap();
    let (first, _) = badges.get_or_create_badge("first", &defaults("First")).unwrap();
    let (second, _) = badges
        .get_or_create_badge("second", &defaults("Second"))
        .unwrap();
    awards.create_award(ada.id, first.id).unwrap();
    awards.create_award(ada.id, second.id).unwrap();

    assert_eq!(awards.delete_awards(Some(&[][..])).unwrap(), 0);
    assert_eq!(awards.delete_awards(Some(&[first.id][..])).unwrap(), 1);
    assert_eq!(awards.count_awards_for_badge(second.id).unwrap(), 1);
    assert_eq!(awards.delete_awards(None).unwrap(), 1);
    assert!(awards.list_badges_for_user(ada.id).unwrap().is_empty());
}

#[test]
fn award_for_unknown_user_is_a_db_error() {
    let conn = open_db_in_memory().unwrap();
    let badges = SqliteBadgeRepository::new(&conn);
    let awards = SqliteAwardRepository::new(&conn);
    let (badge, _) = badges.get_or_create_badge("first", &defaults("First")).unwrap();

    let err = awards.create_award(999, badge.id).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn long_filter_lists_are_split_across_statements() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);
    let badges = SqliteBadgeRepository::new(&conn);
    let awards = SqliteAwardRepository::new(&conn);

    let ada = users.create_user(&NewUser::new("ada", "")).unwrap();
    let bob = users.create_user(&NewUser::new("bob", "")).unwrap();
    let (badge, _) = badges.get_or_create_badge("first", &defaults("First")).unwrap();
    awards.create_award(ada.id, badge.id).unwrap();

    // Past SQLite's default 32766 bound-variable limit.
    let mut ids: Vec<i64> = (1_000_000..1_040_000).collect();
    ids.push(bob.id);
    ids.push(ada.id);
    let found = users.list_users(&UserListQuery::by_ids(ids.clone())).unwrap();
    assert_eq!(
        found.iter().map(|u| u.id).collect::<Vec<_>>(),
        vec![ada.id, bob.id]
    );

    let mut names: Vec<String> = (0..1_200).map(|n| format!("ghost{n}")).collect();
    names.push("bob".to_string());
    let query = UserListQuery {
        ids: Some(ids),
        usernames: Some(names),
        active_only: false,
    };
    assert_eq!(users.list_users(&query).unwrap(), vec![bob]);

    let mut badge_ids: Vec<i64> = (1_000_000..1_040_000).collect();
    badge_ids.push(badge.id);
    assert_eq!(awards.delete_awards(Some(&badge_ids[..])).unwrap(), 1);
    assert_eq!(awards.count_awards_for_badge(badge.id).unwrap(), 0);
}
