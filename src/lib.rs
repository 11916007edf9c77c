//! Tutor backend - AI tutoring service with study planning and gamified progress
//!
//! This library provides the core functionality for the tutoring backend:
//! - Accounts, conversation threads and the chat log
//! - Context compaction (recent exchanges verbatim, older ones summarized)
//! - Progress tracking (XP, levels, daily streaks)
//! - Topics, goals, study plans, feedback and simulated subscriptions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     HTTP API                         │
//! │   Users  │  Chat  │  Goals  │  Plans  │  Materials  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   Context Builder   │  Progress Tracker  │  Tutor   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              SQLite (r2d2 pool)                      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod materials;
pub mod progress;
pub mod security;
pub mod templates;
pub mod tutor;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use config::Config;
pub use context::{ContextBuilder, ContextConfig};
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
pub use materials::StudyMaterials;
pub use progress::{ProgressConfig, ProgressEngine, ProgressReport, ProgressTracker, UserProgress};
pub use tutor::{OllamaModel, Tutor, TutorModel};
