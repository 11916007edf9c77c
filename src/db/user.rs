//! User repository for accounts and progress persistence

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};

use super::thread::DEFAULT_THREAD_NAME;
use super::DbPool;
use crate::progress::UserProgress;
use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Parent,
    Teacher,
    Admin,
}

impl Role {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Parent => "parent",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "parent" => Some(Self::Parent),
            "teacher" => Some(Self::Teacher),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// A registered user
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub progress: UserProgress,
    pub created_at: DateTime<Utc>,
}

/// User repository
#[derive(Clone)]
pub struct UserRepo {
    pool: DbPool,
}

const USER_COLUMNS: &str =
    "id, username, role, xp, level, streak_count, last_activity_date, created_at";

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        role: Role::parse(&row.get::<_, String>(2)?).unwrap_or_default(),
        progress: progress_from_columns(row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?),
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn progress_from_columns(
    xp: i64,
    level: i64,
    streak_count: i64,
    last_activity_date: Option<String>,
) -> UserProgress {
    UserProgress {
        xp: u64::try_from(xp).unwrap_or(0),
        level: u32::try_from(level).unwrap_or(0),
        streak_count: u32::try_from(streak_count).unwrap_or(0),
        // An unparseable stored date behaves like no prior activity
        last_activity_date: last_activity_date
            .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
    }
}

impl UserRepo {
    /// Create a new user repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Register a user together with their default conversation thread
    ///
    /// # Errors
    ///
    /// Returns `Error::Conflict` if the username is taken, or a database error
    pub fn create(&self, username: &str, password_hash: &str, role: Role) -> Result<User> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let tx = conn.transaction()?;

        let taken: Option<i64> = tx
            .query_row("SELECT id FROM users WHERE username = ?1", [username], |row| {
                row.get(0)
            })
            .optional()?;
        if taken.is_some() {
            return Err(Error::Conflict("username already registered".to_string()));
        }

        let now = Utc::now();
        let now_str = now.to_rfc3339();

        tx.execute(
            "INSERT INTO users (username, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            [username, password_hash, role.as_str(), now_str.as_str()],
        )?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO threads (user_id, name, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![id, DEFAULT_THREAD_NAME, &now_str],
        )?;

        tx.commit()?;

        tracing::info!(user_id = id, username, "registered user");

        Ok(User {
            id,
            username: username.to_string(),
            role,
            progress: UserProgress::default(),
            created_at: now,
        })
    }

    /// Find a user by ID (returns None if not found)
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, id: i64) -> Result<Option<User>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id],
                row_to_user,
            )
            .optional()?;

        Ok(user)
    }

    /// Check that a user exists
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.find(id)?.is_some())
    }

    /// Find a user and their stored password hash by username
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let found = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?1"),
                [username],
                |row| Ok((row_to_user(row)?, row.get::<_, String>(8)?)),
            )
            .optional()?;

        Ok(found)
    }

    /// List all users
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list_all(&self) -> Result<Vec<User>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;

        let users = stmt
            .query_map([], row_to_user)?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(users)
    }

    /// Load, transform and store a user's progress as one atomic step
    ///
    /// The write lock is taken before the read so concurrent updates for
    /// the same user serialize instead of losing an increment.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the user does not exist, or a database error
    pub fn update_progress<F>(&self, user_id: i64, apply: F) -> Result<UserProgress>
    where
        F: FnOnce(UserProgress) -> UserProgress,
    {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                "SELECT xp, level, streak_count, last_activity_date FROM users WHERE id = ?1",
                [user_id],
                |row| {
                    Ok(progress_from_columns(
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                    ))
                },
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("user {user_id}")))?;

        let updated = apply(current);

        tx.execute(
            "UPDATE users SET xp = ?1, level = ?2, streak_count = ?3, last_activity_date = ?4
             WHERE id = ?5",
            rusqlite::params![
                i64::try_from(updated.xp).unwrap_or(i64::MAX),
                updated.level,
                updated.streak_count,
                updated
                    .last_activity_date
                    .map(|d| d.format(DATE_FORMAT).to_string()),
                user_id,
            ],
        )?;

        tx.commit()?;

        Ok(updated)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    fn setup() -> UserRepo {
        let pool = init_memory().unwrap();
        UserRepo::new(pool)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_create_and_find_user() {
        let repo = setup();

        let user = repo.create("alice", "hash", Role::Student).unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.progress, UserProgress::default());

        let found = repo.find(user.id).unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.role, Role::Student);
        assert!(repo.exists(user.id).unwrap());
        assert!(!repo.exists(user.id + 100).unwrap());
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let repo = setup();

        repo.create("bob", "hash", Role::Parent).unwrap();
        let err = repo.create("bob", "other", Role::Student).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_find_credentials() {
        let repo = setup();

        repo.create("carol", "stored-hash", Role::Teacher).unwrap();
        let (user, hash) = repo.find_credentials("carol").unwrap().unwrap();
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(hash, "stored-hash");
        assert!(repo.find_credentials("nobody").unwrap().is_none());
    }

    #[test]
    fn test_update_progress_round_trips_date() {
        let repo = setup();
        let user = repo.create("dave", "hash", Role::Student).unwrap();

        let updated = repo
            .update_progress(user.id, |p| UserProgress {
                xp: p.xp + 120,
                level: 1,
                streak_count: 3,
                last_activity_date: Some(date("2025-08-02")),
            })
            .unwrap();
        assert_eq!(updated.xp, 120);

        let stored = repo.find(user.id).unwrap().unwrap().progress;
        assert_eq!(stored, updated);
    }

    #[test]
    fn test_update_progress_missing_user() {
        let repo = setup();
        let err = repo.update_progress(42, |p| p).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
