//! Weekly challenges rotated on ISO week boundaries.
//!
//! Each learner has at most one active [`ChallengeInstance`]. When the ISO
//! week changes, the outgoing instance is scored, appended to history and
//! replaced by a fresh instance for the new week. Rollover is the only place
//! challenge XP is credited.

mod catalog;
mod sync;

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

pub use catalog::{active_challenge_index, ChallengeCatalog, WeeklyChallenge};
pub use sync::{Celebration, ChallengeSynchronizer, DayMark, SyncOutcome, WeekScore};

/// ISO-8601 week identity. Ordered by ISO year, then week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IsoWeek {
    pub year: i32,
    pub week: u32,
}

impl IsoWeek {
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    pub fn monday(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
    }

    /// Whole weeks from `self` to `later`; `None` if either week is invalid.
    pub fn weeks_until(&self, later: IsoWeek) -> Option<i64> {
        Some((later.monday()? - self.monday()?).num_days() / 7)
    }
}

/// Monday-start ISO-8601 week number of `date`.
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Challenge day number of `date`: Monday = 1 ... Sunday = 7.
pub fn challenge_day(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}

/// The learner's challenge for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeInstance {
    pub challenge_id: String,
    pub week: IsoWeek,
    pub start_date: NaiveDate,
    /// Subset of 1..=7.
    #[serde(default)]
    pub completed_days: BTreeSet<u8>,
}

/// A finalized week. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeHistoryEntry {
    pub challenge_id: String,
    pub week: IsoWeek,
    pub completed_days: BTreeSet<u8>,
    pub completed_at: DateTime<Utc>,
    pub xp_earned: u32,
    pub full_complete: bool,
    pub partial: bool,
    pub badge_earned: Option<String>,
}

/// Derived at rollover only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeStats {
    pub total_completed: u32,
    pub current_weekly_streak: u32,
    pub best_weekly_streak: u32,
}

/// All challenge state of one learner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeState {
    #[serde(default)]
    pub active: Option<ChallengeInstance>,
    #[serde(default)]
    pub history: Vec<ChallengeHistoryEntry>,
    #[serde(default)]
    pub stats: ChallengeStats,
}

impl ChallengeState {
    pub fn earned_challenge_badges(&self) -> BTreeSet<String> {
        self.history
            .iter()
            .filter_map(|h| h.badge_earned.clone())
            .collect()
    }
}
