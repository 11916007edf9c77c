//! Database module for accounts, conversations, study planning and progress

pub mod feedback;
pub mod goal;
pub mod plan;
mod schema;
pub mod subscription;
pub mod summary;
pub mod thread;
pub mod topic;
pub mod user;

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::{Error, Result};

pub use feedback::{Feedback, FeedbackRepo, NewFeedback};
pub use goal::{Goal, GoalRepo, NewGoal};
pub use plan::{NewPlan, Plan, PlanRepo};
pub use schema::SCHEMA_VERSION;
pub use subscription::{Subscription, SubscriptionRepo, SubscriptionStatus};
pub use summary::{StoredSummary, SummaryRecord, SummaryRepo};
pub use thread::{ActivityStats, ChatMessage, Thread, ThreadRepo, DEFAULT_THREAD_NAME};
pub use topic::{Topic, TopicRepo};
pub use user::{Role, User, UserRepo};

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled database connection
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Enable foreign keys on every pooled connection
fn manager_with_pragmas(manager: SqliteConnectionManager) -> SqliteConnectionManager {
    manager.with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"))
}

/// Initialize the database
///
/// # Errors
///
/// Returns error if database cannot be opened or initialized
pub fn init<P: AsRef<Path>>(path: P) -> Result<DbPool> {
    let manager = manager_with_pragmas(SqliteConnectionManager::file(path));
    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| Error::Database(e.to_string()))?;

    // Run migrations on first connection
    let conn = pool.get().map_err(|e| Error::Database(e.to_string()))?;
    schema::init(&conn)?;

    tracing::info!(version = SCHEMA_VERSION, "database initialized");
    Ok(pool)
}

/// Initialize an in-memory database (for testing)
///
/// # Errors
///
/// Returns error if database cannot be initialized
pub fn init_memory() -> Result<DbPool> {
    let manager = manager_with_pragmas(SqliteConnectionManager::memory());
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Error::Database(e.to_string()))?;

    let conn = pool.get().map_err(|e| Error::Database(e.to_string()))?;
    schema::init(&conn)?;

    Ok(pool)
}
