//! Thread repository for conversation threads and the chat log

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use super::DbPool;
use crate::{Error, Result};

/// Name of the thread every new account starts with
pub const DEFAULT_THREAD_NAME: &str = "General";

/// A conversation thread
#[derive(Debug, Clone)]
pub struct Thread {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One student message and the tutor's reply
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    pub thread_id: i64,
    pub message: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate chat activity for a user
#[derive(Debug, Clone, Default)]
pub struct ActivityStats {
    pub total_messages: usize,
    pub last_activity: Option<DateTime<Utc>>,
    /// Distinct calendar days with at least one message
    pub session_days: usize,
}

/// Thread repository
#[derive(Clone)]
pub struct ThreadRepo {
    pool: DbPool,
}

fn row_to_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<Thread> {
    Ok(Thread {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

impl ThreadRepo {
    /// Create a new thread repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a thread for a user
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn create(&self, user_id: i64, name: &str) -> Result<Thread> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let now = Utc::now();

        conn.execute(
            "INSERT INTO threads (user_id, name, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![user_id, name, now.to_rfc3339()],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(Thread {
            id: conn.last_insert_rowid(),
            user_id,
            name: name.to_string(),
            created_at: now,
        })
    }

    /// Find a thread by ID
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, id: i64) -> Result<Option<Thread>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let thread = conn
            .query_row(
                "SELECT id, user_id, name, created_at FROM threads WHERE id = ?1",
                [id],
                row_to_thread,
            )
            .optional()?;

        Ok(thread)
    }

    /// List a user's threads, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list_for_user(&self, user_id: i64) -> Result<Vec<Thread>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, created_at FROM threads
             WHERE user_id = ?1 ORDER BY created_at, id",
        )?;

        let threads = stmt
            .query_map([user_id], row_to_thread)?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(threads)
    }

    /// Append a message pair to a thread
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn add_message(
        &self,
        user_id: i64,
        thread_id: i64,
        message: &str,
        response: &str,
    ) -> Result<ChatMessage> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let now = Utc::now();

        conn.execute(
            "INSERT INTO messages (user_id, thread_id, message, response, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![user_id, thread_id, message, response, now.to_rfc3339()],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(ChatMessage {
            id: conn.last_insert_rowid(),
            user_id,
            thread_id,
            message: message.to_string(),
            response: response.to_string(),
            created_at: now,
        })
    }

    /// All message pairs in a thread, in the order they occurred
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn messages(&self, user_id: i64, thread_id: i64) -> Result<Vec<ChatMessage>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, user_id, thread_id, message, response, created_at
             FROM messages WHERE user_id = ?1 AND thread_id = ?2
             ORDER BY id ASC",
        )?;

        let messages = stmt
            .query_map([user_id, thread_id], |row| {
                Ok(ChatMessage {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    thread_id: row.get(2)?,
                    message: row.get(3)?,
                    response: row.get(4)?,
                    created_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            })?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(messages)
    }

    /// Count the message pairs in one thread
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn thread_message_count(&self, user_id: i64, thread_id: i64) -> Result<usize> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE user_id = ?1 AND thread_id = ?2",
            [user_id, thread_id],
            |row| row.get(0),
        )?;

        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Count a user's messages across all threads
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn message_count(&self, user_id: i64) -> Result<usize> {
        Ok(self.activity_stats(user_id)?.total_messages)
    }

    /// Totals used by the dashboard
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn activity_stats(&self, user_id: i64) -> Result<ActivityStats> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let (count, last, days): (i64, Option<String>, i64) = conn.query_row(
            "SELECT COUNT(*), MAX(created_at), COUNT(DISTINCT substr(created_at, 1, 10))
             FROM messages WHERE user_id = ?1",
            [user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(ActivityStats {
            total_messages: usize::try_from(count).unwrap_or(0),
            last_activity: last.as_deref().map(parse_datetime),
            session_days: usize::try_from(days).unwrap_or(0),
        })
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory, Role, UserRepo};

    fn setup() -> (ThreadRepo, i64) {
        let pool = init_memory().unwrap();
        let user = UserRepo::new(pool.clone())
            .create("threader", "hash", Role::Student)
            .unwrap();
        (ThreadRepo::new(pool), user.id)
    }

    #[test]
    fn test_new_user_has_general_thread() {
        let (repo, user_id) = setup();

        let threads = repo.list_for_user(user_id).unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].name, DEFAULT_THREAD_NAME);
    }

    #[test]
    fn test_create_and_find_thread() {
        let (repo, user_id) = setup();

        let thread = repo.create(user_id, "Algebra Practice").unwrap();
        let found = repo.find(thread.id).unwrap().unwrap();
        assert_eq!(found.name, "Algebra Practice");
        assert_eq!(found.user_id, user_id);
        assert_eq!(repo.list_for_user(user_id).unwrap().len(), 2);
        assert!(repo.find(thread.id + 50).unwrap().is_none());
    }

    #[test]
    fn test_messages_are_chronological_and_scoped() {
        let (repo, user_id) = setup();
        let general = repo.list_for_user(user_id).unwrap()[0].id;
        let other = repo.create(user_id, "Other").unwrap().id;

        repo.add_message(user_id, general, "first", "one").unwrap();
        repo.add_message(user_id, other, "elsewhere", "x").unwrap();
        repo.add_message(user_id, general, "second", "two").unwrap();

        let messages = repo.messages(user_id, general).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message, "first");
        assert_eq!(messages[1].response, "two");
        assert_eq!(repo.thread_message_count(user_id, general).unwrap(), 2);
        assert_eq!(repo.thread_message_count(user_id, other).unwrap(), 1);
    }

    #[test]
    fn test_activity_stats() {
        let (repo, user_id) = setup();
        let general = repo.list_for_user(user_id).unwrap()[0].id;

        let empty = repo.activity_stats(user_id).unwrap();
        assert_eq!(empty.total_messages, 0);
        assert!(empty.last_activity.is_none());
        assert_eq!(empty.session_days, 0);

        repo.add_message(user_id, general, "a", "b").unwrap();
        repo.add_message(user_id, general, "c", "d").unwrap();

        let stats = repo.activity_stats(user_id).unwrap();
        assert_eq!(stats.total_messages, 2);
        assert!(stats.last_activity.is_some());
        assert_eq!(stats.session_days, 1);
        assert_eq!(repo.message_count(user_id).unwrap(), 2);
    }
}
