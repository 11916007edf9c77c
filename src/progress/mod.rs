//! Gamified progress: XP, levels and daily streaks
//!
//! [`ProgressEngine`] holds the pure rules; [`ProgressTracker`] loads a
//! user's snapshot, applies an activity and stores the result.

mod engine;
mod tracker;

pub use engine::{DEFAULT_XP_THRESHOLDS, ProgressEngine, UserProgress, XpThresholds};
pub use tracker::{ProgressReport, ProgressTracker};

/// XP granted for one chat message
pub const DEFAULT_XP_PER_CHAT: u64 = 10;

/// XP granted when a goal reaches its target
pub const DEFAULT_GOAL_BONUS_XP: u64 = 50;

/// Progress settings
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    pub thresholds: XpThresholds,
    pub xp_per_chat: u64,
    pub goal_bonus_xp: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            thresholds: XpThresholds::default(),
            xp_per_chat: DEFAULT_XP_PER_CHAT,
            goal_bonus_xp: DEFAULT_GOAL_BONUS_XP,
        }
    }
}
