//! User repository contract and SQLite implementation.
//!
//! Recipes only read users; writes exist so standalone deployments and tests
//! can populate the user base.

use crate::model::user::{NewUser, User, UserId};
use crate::repo::{
    bool_to_int, int_to_bool, placeholders, RepoError, RepoResult, MAX_IN_BINDS,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    is_active,
    is_staff,
    date_joined
FROM users";

/// Candidate filter for user listing and award passes.
///
/// The default query selects the whole user base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListQuery {
    /// Restrict to these ids when set.
    pub ids: Option<Vec<UserId>>,
    /// Restrict to these usernames when set.
    pub usernames: Option<Vec<String>>,
    pub active_only: bool,
}

impl UserListQuery {
    pub fn by_ids(ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            ids: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn by_usernames<S: Into<String>>(usernames: impl IntoIterator<Item = S>) -> Self {
        Self {
            usernames: Some(usernames.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }
}

/// Repository interface for user rows.
pub trait UserRepository {
    fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    fn update_user(&self, user: &User) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Lists users matching `query` ordered by id.
    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_one(&self, filter: &str, bind: Value) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE {filter};"))?;
        let mut rows = stmt.query([bind])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users_page(
        &self,
        active_only: bool,
        ids: Option<&[UserId]>,
        usernames: Option<&[String]>,
    ) -> RepoResult<Vec<User>> {
        let mut sql = format!("{USER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if active_only {
            sql.push_str(" AND is_active = 1");
        }
        if let Some(ids) = ids {
            sql.push_str(&format!(" AND id IN ({})", placeholders(ids.len())));
            bind_values.extend(ids.iter().map(|id| Value::Integer(*id)));
        }
        if let Some(usernames) = usernames {
            sql.push_str(&format!(
                " AND username IN ({})",
                placeholders(usernames.len())
            ));
            bind_values.extend(usernames.iter().map(|name| Value::Text(name.clone())));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (username, email, is_active, is_staff)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.username.as_str(),
                user.email.as_str(),
                bool_to_int(user.is_active),
                bool_to_int(user.is_staff),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_user(id)?
            .ok_or_else(|| RepoError::not_found("user", id))
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        NewUser {
            username: user.username.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
            is_staff: user.is_staff,
        }
        .validate()?;

        let changed = self.conn.execute(
            "UPDATE users
             SET username = ?1, email = ?2, is_active = ?3, is_staff = ?4
             WHERE id = ?5;",
            params![
                user.username.as_str(),
                user.email.as_str(),
                bool_to_int(user.is_active),
                bool_to_int(user.is_staff),
                user.id,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("user", user.id));
        }
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.query_one("id = ?1", Value::Integer(id))
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.query_one("username = ?1", Value::Text(username.to_string()))
    }

    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>> {
        if query.ids.as_ref().is_some_and(Vec::is_empty)
            || query.usernames.as_ref().is_some_and(Vec::is_empty)
        {
            return Ok(Vec::new());
        }

        // Each user falls in exactly one id chunk and one username chunk, so
        // the pages are disjoint.
        let mut users = Vec::new();
        for ids in in_chunks(query.ids.as_deref()) {
            for usernames in in_chunks(query.usernames.as_deref()) {
                users.extend(self.list_users_page(query.active_only, ids, usernames)?);
            }
        }
        users.sort_by_key(|user| user.id);
        Ok(users)
    }
}

/// Splits an optional filter list into `IN` sized pieces; `None` stays a
/// single unfiltered page.
fn in_chunks<T>(values: Option<&[T]>) -> Vec<Option<&[T]>> {
    match values {
        None => vec![None],
        Some(values) => values.chunks(MAX_IN_BINDS).map(Some).collect(),
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        is_active: int_to_bool(row.get("is_active")?, "users.is_active")?,
        is_staff: int_to_bool(row.get("is_staff")?, "users.is_staff")?,
        date_joined: row.get("date_joined")?,
    })
}


