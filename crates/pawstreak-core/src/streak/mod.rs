//! Daily-practice streaks.
//!
//! The streak is either `NoStreak` (current = 0) or `Active`, with an
//! orthogonal recovery flag. Two transitions drive it:
//! - a break-check, comparing the last training day against today, which can
//!   spend a freeze token or break the streak;
//! - a training-day event, which extends the streak and unlocks milestones.

mod engine;
mod milestones;

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use engine::{RecoveryProgress, StreakCheck, StreakEngine, StreakUpdate};
pub use milestones::{
    milestone_reward, next_milestone, MilestoneReward, MilestoneUnlock, MILESTONES,
};

/// Freeze tokens that forgive a single missed day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeState {
    pub available: u32,
    pub total_used: u32,
    #[serde(default, deserialize_with = "crate::lenient::date")]
    pub last_used_date: Option<NaiveDate>,
}

/// Post-break recovery progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryState {
    pub active: bool,
    pub days_completed: u32,
    #[serde(default, deserialize_with = "crate::lenient::datetime")]
    pub start_date: Option<DateTime<Utc>>,
    /// Last calendar day counted towards recovery.
    #[serde(default, deserialize_with = "crate::lenient::date")]
    pub last_day: Option<NaiveDate>,
}

/// A streak that ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakHistoryEntry {
    pub streak: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub broken_date: NaiveDate,
}

/// Coarse streak status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakStatus {
    NoStreak,
    Active,
}

/// Persistent streak state of one learner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current: u32,
    pub best: u32,
    #[serde(default, deserialize_with = "crate::lenient::date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "crate::lenient::date")]
    pub last_training_date: Option<NaiveDate>,
    #[serde(default)]
    pub freezes: FreezeState,
    #[serde(default)]
    pub recovery: RecoveryState,
    /// Milestones ever reached. Never shrinks.
    #[serde(default)]
    pub milestones_unlocked: BTreeSet<u32>,
    #[serde(default)]
    pub recoveries_completed: u32,
    /// Append-only.
    #[serde(default)]
    pub history: Vec<StreakHistoryEntry>,
}

impl StreakState {
    pub fn status(&self) -> StreakStatus {
        if self.current == 0 {
            StreakStatus::NoStreak
        } else {
            StreakStatus::Active
        }
    }

    pub fn is_recovering(&self) -> bool {
        self.recovery.active
    }

    /// Whole calendar days since the last training day.
    pub fn days_since_training(&self, today: NaiveDate) -> Option<i64> {
        self.last_training_date.map(|last| (today - last).num_days())
    }

    pub fn trained_on(&self, day: NaiveDate) -> bool {
        self.last_training_date == Some(day)
    }
}
