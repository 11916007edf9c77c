//! Goal repository for per-topic study targets

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use super::DbPool;
use crate::{Error, Result};

/// A study goal: complete `target_sessions` sessions on a topic
#[derive(Debug, Clone)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub topic_id: i64,
    pub description: Option<String>,
    pub target_sessions: u32,
    pub completed_sessions: u32,
    pub due_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Whether the completed count has reached the target
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.completed_sessions >= self.target_sessions
    }
}

/// Fields for a new goal
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub user_id: i64,
    pub topic_id: i64,
    pub description: Option<String>,
    pub target_sessions: u32,
    pub due_date: Option<String>,
}

/// Goal repository
#[derive(Clone)]
pub struct GoalRepo {
    pool: DbPool,
}

pub(super) const GOAL_COLUMNS: &str =
    "id, user_id, topic_id, description, target_sessions, completed_sessions, due_date, created_at";

pub(super) fn row_to_goal(row: &rusqlite::Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        topic_id: row.get(2)?,
        description: row.get(3)?,
        target_sessions: row.get(4)?,
        completed_sessions: row.get(5)?,
        due_date: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

impl GoalRepo {
    /// Create a new goal repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a goal
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a zero target, `Error::NotFound` if the
    /// user or topic does not exist, or a database error
    pub fn create(&self, goal: &NewGoal) -> Result<Goal> {
        if goal.target_sessions == 0 {
            return Err(Error::Validation(
                "target_sessions must be greater than 0".to_string(),
            ));
        }

        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let user: Option<i64> = conn
            .query_row("SELECT id FROM users WHERE id = ?1", [goal.user_id], |row| {
                row.get(0)
            })
            .optional()?;
        if user.is_none() {
            return Err(Error::NotFound("User not found".to_string()));
        }

        let topic: Option<i64> = conn
            .query_row("SELECT id FROM topics WHERE id = ?1", [goal.topic_id], |row| {
                row.get(0)
            })
            .optional()?;
        if topic.is_none() {
            return Err(Error::NotFound("Topic not found".to_string()));
        }

        let now = Utc::now();

        conn.execute(
            "INSERT INTO goals (user_id, topic_id, description, target_sessions, completed_sessions, due_date, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
            rusqlite::params![
                goal.user_id,
                goal.topic_id,
                goal.description,
                goal.target_sessions,
                goal.due_date,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Goal {
            id: conn.last_insert_rowid(),
            user_id: goal.user_id,
            topic_id: goal.topic_id,
            description: goal.description.clone(),
            target_sessions: goal.target_sessions,
            completed_sessions: 0,
            due_date: goal.due_date.clone(),
            created_at: now,
        })
    }

    /// Find a goal by ID
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, id: i64) -> Result<Option<Goal>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let goal = conn
            .query_row(
                &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"),
                [id],
                row_to_goal,
            )
            .optional()?;

        Ok(goal)
    }

    /// List a user's goals in creation order
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list_for_user(&self, user_id: i64) -> Result<Vec<Goal>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 ORDER BY created_at, id"
        ))?;

        let goals = stmt
            .query_map([user_id], row_to_goal)?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(goals)
    }

    /// Record one completed session and return the updated goal
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the goal does not exist, or a database error
    pub fn record_session(&self, id: i64) -> Result<Goal> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let goal = conn
            .query_row(
                &format!(
                    "UPDATE goals SET completed_sessions = completed_sessions + 1
                     WHERE id = ?1 RETURNING {GOAL_COLUMNS}"
                ),
                [id],
                row_to_goal,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound("Goal not found".to_string()))?;

        Ok(goal)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
