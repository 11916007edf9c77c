//! Persisted progress updates

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use super::{ProgressConfig, ProgressEngine, UserProgress};
use crate::db::UserRepo;
use crate::{Error, Result};

/// Progress plus the distance to the next level
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub xp: u64,
    pub level: u32,
    pub streak_count: u32,
    pub last_activity_date: Option<NaiveDate>,
    /// `None` at the top level
    pub next_level_xp: Option<u64>,
}

/// Applies activities to stored user progress
#[derive(Clone)]
pub struct ProgressTracker {
    users: UserRepo,
    engine: ProgressEngine,
    xp_per_chat: u64,
    goal_bonus_xp: u64,
}

impl ProgressTracker {
    /// Create a tracker over the user store
    #[must_use]
    pub fn new(users: UserRepo, config: ProgressConfig) -> Self {
        Self {
            users,
            engine: ProgressEngine::new(config.thresholds),
            xp_per_chat: config.xp_per_chat,
            goal_bonus_xp: config.goal_bonus_xp,
        }
    }

    /// Credit one chat message on `date`
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the user does not exist, or a database error
    pub fn record_chat(&self, user_id: i64, date: NaiveDate) -> Result<UserProgress> {
        self.apply(user_id, self.xp_per_chat, date)
    }

    /// Credit the goal-completion bonus on `date`
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the user does not exist, or a database error
    pub fn award_goal_bonus(&self, user_id: i64, date: NaiveDate) -> Result<UserProgress> {
        self.apply(user_id, self.goal_bonus_xp, date)
    }

    /// Credit a chat message today (UTC)
    ///
    /// # Errors
    ///
    /// See [`Self::record_chat`]
    pub fn record_chat_today(&self, user_id: i64) -> Result<UserProgress> {
        self.record_chat(user_id, Utc::now().date_naive())
    }

    /// Credit the goal bonus today (UTC)
    ///
    /// # Errors
    ///
    /// See [`Self::award_goal_bonus`]
    pub fn award_goal_bonus_today(&self, user_id: i64) -> Result<UserProgress> {
        self.award_goal_bonus(user_id, Utc::now().date_naive())
    }

    /// Current progress with the XP needed for the next level
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the user does not exist, or a database error
    pub fn report(&self, user_id: i64) -> Result<ProgressReport> {
        let user = self
            .users
            .find(user_id)?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        Ok(self.report_for(user.progress))
    }

    /// Report for an already loaded snapshot
    #[must_use]
    pub fn report_for(&self, progress: UserProgress) -> ProgressReport {
        ProgressReport {
            xp: progress.xp,
            level: progress.level,
            streak_count: progress.streak_count,
            last_activity_date: progress.last_activity_date,
            next_level_xp: self.engine.thresholds().next_threshold(progress.level),
        }
    }

    fn apply(&self, user_id: i64, xp_gain: u64, date: NaiveDate) -> Result<UserProgress> {
        let updated = self
            .users
            .update_progress(user_id, |current| {
                self.engine.apply_activity(current, xp_gain, date)
            })?;

        tracing::debug!(
            user_id,
            xp = updated.xp,
            level = updated.level,
            streak = updated.streak_count,
            "progress updated"
        );

        Ok(updated)
    }
}
