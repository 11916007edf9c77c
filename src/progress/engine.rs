//! XP, level and daily-streak computation
//!
//! The engine never touches storage: callers load a [`UserProgress`]
//! snapshot, apply an activity and persist the returned value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default level thresholds: level `i` requires `DEFAULT_XP_THRESHOLDS[i]` XP
pub const DEFAULT_XP_THRESHOLDS: [u64; 6] = [0, 100, 250, 500, 1000, 2000];

/// Ordered XP thresholds for leveling
///
/// Always non-empty, starts at 0 and is strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XpThresholds(Vec<u64>);

impl XpThresholds {
    /// Build a threshold table
    ///
    /// # Errors
    ///
    /// Returns error if the table is empty, does not start at 0, or is not
    /// strictly increasing
    pub fn new(thresholds: Vec<u64>) -> Result<Self> {
        match thresholds.first() {
            None => {
                return Err(Error::Config("XP thresholds must not be empty".to_string()));
            }
            Some(&first) if first != 0 => {
                return Err(Error::Config(format!(
                    "XP thresholds must start at 0, got {first}"
                )));
            }
            Some(_) => {}
        }

        if let Some(pair) = thresholds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::Config(format!(
                "XP thresholds must be strictly increasing ({} >= {})",
                pair[0], pair[1]
            )));
        }

        Ok(Self(thresholds))
    }

    /// Threshold for a level, if that level exists
    #[must_use]
    pub fn get(&self, level: u32) -> Option<u64> {
        self.0.get(level as usize).copied()
    }

    /// Level for an absolute XP total
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn level_for(&self, xp: u64) -> u32 {
        // Index 0 is always 0, so at least one threshold matches
        (self.0.partition_point(|&t| t <= xp) - 1) as u32
    }

    /// XP required to reach the level after `level`, if there is one
    #[must_use]
    pub fn next_threshold(&self, level: u32) -> Option<u64> {
        self.get(level.saturating_add(1))
    }

    /// Thresholds as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }
}

impl Default for XpThresholds {
    fn default() -> Self {
        Self(DEFAULT_XP_THRESHOLDS.to_vec())
    }
}

/// A user's gamification state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub xp: u64,
    pub level: u32,
    pub streak_count: u32,
    pub last_activity_date: Option<NaiveDate>,
}

/// Applies activity events to progress snapshots
#[derive(Debug, Clone, Default)]
pub struct ProgressEngine {
    thresholds: XpThresholds,
}

impl ProgressEngine {
    /// Create an engine over a threshold table
    #[must_use]
    pub const fn new(thresholds: XpThresholds) -> Self {
        Self { thresholds }
    }

    /// Threshold table in use
    #[must_use]
    pub const fn thresholds(&self) -> &XpThresholds {
        &self.thresholds
    }

    /// Apply one activity worth `xp_gain` on `event_date`
    ///
    /// A zero gain only updates the streak and activity date.
    #[must_use]
    pub fn apply_activity(
        &self,
        current: UserProgress,
        xp_gain: u64,
        event_date: NaiveDate,
    ) -> UserProgress {
        let xp = current.xp.saturating_add(xp_gain);

        UserProgress {
            xp,
            // Level never decreases
            level: self.thresholds.level_for(xp).max(current.level),
            streak_count: derive_streak(current, event_date),
            last_activity_date: Some(event_date),
        }
    }
}

fn derive_streak(current: UserProgress, event_date: NaiveDate) -> u32 {
    let Some(last) = current.last_activity_date else {
        return 1;
    };

    match (event_date - last).num_days() {
        0 => current.streak_count,
        1 => current.streak_count.saturating_add(1),
        // Gaps and backdated events both reset
        _ => 1,
    }
}
