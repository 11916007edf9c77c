//! Feedback repository for topic ratings

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use super::DbPool;
use crate::{Error, Result};

/// A rating left by a user on a topic
#[derive(Debug, Clone)]
pub struct Feedback {
    pub id: i64,
    pub user_id: i64,
    pub topic_id: i64,
    pub rating: u8,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for new feedback
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub user_id: i64,
    pub topic_id: i64,
    pub rating: u8,
    pub comments: Option<String>,
}

/// Feedback repository
#[derive(Clone)]
pub struct FeedbackRepo {
    pool: DbPool,
}

impl FeedbackRepo {
    /// Create a new feedback repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Store feedback
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the rating is outside 1-5,
    /// `Error::NotFound` if the user or topic does not exist, or a database error
    pub fn create(&self, feedback: &NewFeedback) -> Result<Feedback> {
        if !(1..=5).contains(&feedback.rating) {
            return Err(Error::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let user: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE id = ?1",
                [feedback.user_id],
                |row| row.get(0),
            )
            .optional()?;
        if user.is_none() {
            return Err(Error::NotFound("User not found".to_string()));
        }

        let topic: Option<i64> = conn
            .query_row(
                "SELECT id FROM topics WHERE id = ?1",
                [feedback.topic_id],
                |row| row.get(0),
            )
            .optional()?;
        if topic.is_none() {
            return Err(Error::NotFound("Topic not found".to_string()));
        }

        let now = Utc::now();

        conn.execute(
            "INSERT INTO feedback (user_id, topic_id, rating, comments, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                feedback.user_id,
                feedback.topic_id,
                feedback.rating,
                feedback.comments,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Feedback {
            id: conn.last_insert_rowid(),
            user_id: feedback.user_id,
            topic_id: feedback.topic_id,
            rating: feedback.rating,
            comments: feedback.comments.clone(),
            created_at: now,
        })
    }

    /// List feedback for a topic in submission order
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list_for_topic(&self, topic_id: i64) -> Result<Vec<Feedback>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, user_id, topic_id, rating, comments, created_at
             FROM feedback WHERE topic_id = ?1 ORDER BY id ASC",
        )?;

        let feedback = stmt
            .query_map([topic_id], |row| {
                Ok(Feedback {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    topic_id: row.get(2)?,
                    rating: row.get(3)?,
                    comments: row.get(4)?,
                    created_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            })?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(feedback)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory, Role, UserRepo};

    fn setup() -> (FeedbackRepo, i64) {
        let pool = init_memory().unwrap();
        let user = UserRepo::new(pool.clone())
            .create("critic", "hash", Role::Student)
            .unwrap();
        (FeedbackRepo::new(pool), user.id)
    }

    #[test]
    fn test_create_and_list() {
        let (repo, user_id) = setup();

        repo.create(&NewFeedback {
            user_id,
            topic_id: 3,
            rating: 5,
            comments: Some("Clear explanations".to_string()),
        })
        .unwrap();
        repo.create(&NewFeedback {
            user_id,
            topic_id: 3,
            rating: 2,
            comments: None,
        })
        .unwrap();

        let listed = repo.list_for_topic(3).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].rating, 5);
        assert!(repo.list_for_topic(4).unwrap().is_empty());
    }

    #[test]
    fn test_rating_bounds_and_references() {
        let (repo, user_id) = setup();

        for rating in [0, 6] {
            let err = repo
                .create(&NewFeedback {
                    user_id,
                    topic_id: 1,
                    rating,
                    comments: None,
                })
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }

        let err = repo
            .create(&NewFeedback {
                user_id,
                topic_id: 500,
                rating: 3,
                comments: None,
            })
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
