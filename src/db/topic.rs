//! Topic repository for tutoring subjects

use rusqlite::OptionalExtension;

use super::DbPool;
use crate::{Error, Result};

/// A subject students can set goals and leave feedback on
#[derive(Debug, Clone)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Topic repository
#[derive(Clone)]
pub struct TopicRepo {
    pool: DbPool,
}

fn row_to_topic(row: &rusqlite::Row<'_>) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

impl TopicRepo {
    /// Create a new topic repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List all topics ordered by name
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list(&self) -> Result<Vec<Topic>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare("SELECT id, name, description FROM topics ORDER BY name")?;

        let topics = stmt
            .query_map([], row_to_topic)?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(topics)
    }

    /// Create a topic
    ///
    /// # Errors
    ///
    /// Returns `Error::Conflict` if a topic with that name exists, or a database error
    pub fn create(&self, name: &str, description: Option<&str>) -> Result<Topic> {
        if self.find_by_name(name)?.is_some() {
            return Err(Error::Conflict("Topic already exists".to_string()));
        }

        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO topics (name, description) VALUES (?1, ?2)",
            rusqlite::params![name, description],
        )?;

        Ok(Topic {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.map(ToString::to_string),
        })
    }

    /// Find a topic by ID
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, id: i64) -> Result<Option<Topic>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let topic = conn
            .query_row(
                "SELECT id, name, description FROM topics WHERE id = ?1",
                [id],
                row_to_topic,
            )
            .optional()?;

        Ok(topic)
    }

    /// Find a topic by exact name
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find_by_name(&self, name: &str) -> Result<Option<Topic>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let topic = conn
            .query_row(
                "SELECT id, name, description FROM topics WHERE name = ?1",
                [name],
                row_to_topic,
            )
            .optional()?;

        Ok(topic)
    }
}
