//! Database schema and migrations

use rusqlite::Connection;

use crate::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Subjects seeded into an empty topics table
const DEFAULT_TOPICS: &[(&str, &str)] = &[
    ("Elementary Math", "Fundamental arithmetic and number sense"),
    ("Algebra I", "Introductory algebraic concepts and linear equations"),
    ("Algebra II", "Quadratic equations, polynomials and advanced algebra"),
    ("Geometry", "Shapes, proofs and basic trigonometry"),
    ("Pre-Calculus", "Functions, sequences and trigonometric identities"),
    ("Calculus", "Differential and integral calculus concepts"),
    ("Statistics", "Descriptive and inferential statistics"),
    ("Biology", "Cell structure, genetics and ecosystems"),
    ("Chemistry", "Atomic theory, reactions and stoichiometry"),
    ("Physics", "Motion, forces and energy principles"),
    ("Reading & Literature", "Reading comprehension and literary analysis"),
    ("Grammar & Writing", "Grammar, punctuation and essay writing"),
    ("Spanish Language", "Introductory Spanish vocabulary and grammar"),
    ("French Language", "Introductory French vocabulary and grammar"),
    ("Python Programming", "Fundamentals of Python programming"),
    ("Java Programming", "Object-oriented Java programming basics"),
    ("U.S. History", "Major events and themes in United States history"),
    ("World History", "Global historical events and civilizations"),
    ("Study Skills & Time Management", "Effective study strategies and time management"),
    ("SAT/ACT Prep", "Strategies and practice for standardized tests"),
];

/// Initialize the database schema
///
/// # Errors
///
/// Returns error if migration fails
pub fn init(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- Accounts with gamification state
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL CHECK(role IN ('student', 'parent', 'teacher', 'admin')),
            xp INTEGER NOT NULL DEFAULT 0,
            level INTEGER NOT NULL DEFAULT 0,
            streak_count INTEGER NOT NULL DEFAULT 0,
            last_activity_date TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Conversation threads
        CREATE TABLE IF NOT EXISTS threads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_threads_user ON threads(user_id);

        -- Chat log: one row per student message and tutor reply
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            thread_id INTEGER NOT NULL REFERENCES threads(id),
            message TEXT NOT NULL,
            response TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_thread ON messages(user_id, thread_id);

        -- Condensed history per thread; covered_messages is the older-prefix length it stands for
        CREATE TABLE IF NOT EXISTS summaries (
            user_id INTEGER NOT NULL REFERENCES users(id),
            thread_id INTEGER NOT NULL REFERENCES threads(id),
            summary TEXT NOT NULL,
            covered_messages INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, thread_id)
        );

        CREATE TABLE IF NOT EXISTS subscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL UNIQUE REFERENCES users(id),
            status TEXT NOT NULL DEFAULT 'inactive' CHECK(status IN ('active', 'inactive')),
            start_date TEXT,
            end_date TEXT
        );

        CREATE TABLE IF NOT EXISTS topics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS goals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            topic_id INTEGER NOT NULL REFERENCES topics(id),
            description TEXT,
            target_sessions INTEGER NOT NULL CHECK(target_sessions > 0),
            completed_sessions INTEGER NOT NULL DEFAULT 0,
            due_date TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id);

        CREATE TABLE IF NOT EXISTS feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            topic_id INTEGER NOT NULL REFERENCES topics(id),
            rating INTEGER NOT NULL CHECK(rating BETWEEN 1 AND 5),
            comments TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_feedback_topic ON feedback(topic_id);

        CREATE TABLE IF NOT EXISTS plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            due_date TEXT,
            recurrence TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS plan_goals (
            plan_id INTEGER NOT NULL REFERENCES plans(id) ON DELETE CASCADE,
            goal_id INTEGER NOT NULL REFERENCES goals(id),
            PRIMARY KEY (plan_id, goal_id)
        );

        PRAGMA user_version = 1;
        ",
    )?;

    tracing::info!("migrated to schema v1");
    Ok(())
}

fn migrate_v2(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM topics", [], |row| row.get(0))?;

    if count == 0 {
        let mut stmt = conn.prepare("INSERT INTO topics (name, description) VALUES (?1, ?2)")?;
        for (name, description) in DEFAULT_TOPICS {
            stmt.execute([*name, *description])?;
        }
    }

    conn.execute_batch("PRAGMA user_version = 2;")?;

    tracing::info!(seeded = count == 0, "migrated to schema v2");
    Ok(())
}
