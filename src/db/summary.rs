//! Summary repository for condensed conversation history

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use super::DbPool;
use crate::{Error, Result};

/// A stored thread summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSummary {
    pub text: String,
    /// Length of the older-message prefix `text` stands for
    pub covered: usize,
}

impl StoredSummary {
    /// A summary standing for the first `covered` message pairs
    #[must_use]
    pub fn new(text: impl Into<String>, covered: usize) -> Self {
        Self {
            text: text.into(),
            covered,
        }
    }
}

/// Summary row with its owner and timestamp
#[derive(Debug, Clone)]
pub struct SummaryRecord {
    pub user_id: i64,
    pub thread_id: i64,
    pub summary: StoredSummary,
    pub updated_at: DateTime<Utc>,
}

/// Summary repository
#[derive(Clone)]
pub struct SummaryRepo {
    pool: DbPool,
}

impl SummaryRepo {
    /// Create a new summary repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the summary for a thread
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn get(&self, user_id: i64, thread_id: i64) -> Result<Option<SummaryRecord>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let record = conn
            .query_row(
                "SELECT summary, covered_messages, updated_at FROM summaries
                 WHERE user_id = ?1 AND thread_id = ?2",
                [user_id, thread_id],
                |row| {
                    let covered: i64 = row.get(1)?;
                    Ok(SummaryRecord {
                        user_id,
                        thread_id,
                        summary: StoredSummary {
                            text: row.get(0)?,
                            covered: usize::try_from(covered).unwrap_or(0),
                        },
                        updated_at: parse_datetime(&row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    /// Insert or replace the summary for a thread
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn upsert(&self, user_id: i64, thread_id: i64, summary: &StoredSummary) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO summaries (user_id, thread_id, summary, covered_messages, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, thread_id) DO UPDATE SET
                summary = excluded.summary,
                covered_messages = excluded.covered_messages,
                updated_at = excluded.updated_at",
            rusqlite::params![
                user_id,
                thread_id,
                summary.text,
                i64::try_from(summary.covered).unwrap_or(i64::MAX),
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Replace the text of an existing summary
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the thread has no summary, or a database error
    pub fn update(&self, user_id: i64, thread_id: i64, summary: &StoredSummary) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let updated = conn.execute(
            "UPDATE summaries SET summary = ?1, covered_messages = ?2, updated_at = ?3
             WHERE user_id = ?4 AND thread_id = ?5",
            rusqlite::params![
                summary.text,
                i64::try_from(summary.covered).unwrap_or(i64::MAX),
                Utc::now().to_rfc3339(),
                user_id,
                thread_id,
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound("Summary not found".to_string()));
        }

        Ok(())
    }

    /// Delete the summary for a thread
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn delete(&self, user_id: i64, thread_id: i64) -> Result<bool> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let deleted = conn.execute(
            "DELETE FROM summaries WHERE user_id = ?1 AND thread_id = ?2",
            [user_id, thread_id],
        )?;

        Ok(deleted > 0)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
