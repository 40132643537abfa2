//! Persistent engagement record of one learner.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::LifeStage;
use crate::challenge::ChallengeState;
use crate::freshness::SkillFreshnessRecord;
use crate::streak::StreakState;

/// Running counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerTotals {
    pub xp: u64,
    pub sessions: u32,
    pub journal_entries: u32,
    pub photos: u32,
}

/// Everything the engine reads and mutates for a learner.
///
/// Serialized as one JSON document by the repositories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementState {
    pub learner_id: String,
    #[serde(default)]
    pub life_stage: Option<LifeStage>,
    #[serde(default)]
    pub player_level: u32,
    /// Keyed by exercise id.
    #[serde(default)]
    pub freshness: BTreeMap<String, SkillFreshnessRecord>,
    #[serde(default)]
    pub completed_exercises: BTreeSet<String>,
    #[serde(default)]
    pub totals: LearnerTotals,
    #[serde(default)]
    pub streak: StreakState,
    #[serde(default)]
    pub challenge: ChallengeState,
    /// Never shrinks.
    #[serde(default)]
    pub earned_badges: BTreeSet<String>,
    #[serde(default, deserialize_with = "crate::lenient::datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EngagementState {
    pub fn new(learner_id: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            player_level: 1,
            ..Default::default()
        }
    }

    pub fn credit_xp(&mut self, amount: u32) -> u64 {
        self.totals.xp = self.totals.xp.saturating_add(u64::from(amount));
        self.totals.xp
    }

    pub fn add_journal_entry(&mut self) {
        self.totals.journal_entries += 1;
    }

    pub fn add_photo(&mut self) {
        self.totals.photos += 1;
    }
}
