use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::IsoWeek;

/// Where a block of XP came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
    Session,
    Milestone,
    Challenge,
}

/// Every state change the engine makes produces an event.
/// Callers use them for notifications and the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngagementEvent {
    PracticeLogged {
        exercise_id: String,
        completions: u32,
        first_completion: bool,
        at: DateTime<Utc>,
    },
    XpCredited {
        amount: u32,
        source: XpSource,
        total: u64,
    },
    StreakExtended {
        current: u32,
        on: NaiveDate,
    },
    FreezeUsed {
        streak: u32,
        freezes_remaining: u32,
        on: NaiveDate,
    },
    StreakBroken {
        previous: u32,
        best: u32,
        on: NaiveDate,
    },
    MilestoneUnlocked {
        days: u32,
        xp: u32,
        freezes: u32,
        title: String,
    },
    RecoveryStarted {
        at: DateTime<Utc>,
    },
    RecoveryProgressed {
        days: u32,
        target: u32,
    },
    RecoveryCompleted {
        days: u32,
    },
    ChallengeStarted {
        challenge_id: String,
        week: IsoWeek,
    },
    /// A week was finalized and its XP credited.
    ChallengeRolledOver {
        challenge_id: String,
        week: IsoWeek,
        days_completed: usize,
        xp_earned: u32,
        full_complete: bool,
        partial: bool,
        badge_earned: Option<String>,
    },
    ChallengeDayMarked {
        challenge_id: String,
        day: u8,
        days_completed: usize,
    },
    /// All seven days done before the week ended. Advisory only.
    ChallengeCelebration {
        challenge_id: String,
        bonus_xp: u32,
        badge_id: Option<String>,
    },
    BadgeEarned {
        badge_id: String,
        name: String,
        at: DateTime<Utc>,
    },
}

impl EngagementEvent {
    /// Short kebab-case name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PracticeLogged { .. } => "practice-logged",
            Self::XpCredited { .. } => "xp-credited",
            Self::StreakExtended { .. } => "streak-extended",
            Self::FreezeUsed { .. } => "freeze-used",
            Self::StreakBroken { .. } => "streak-broken",
            Self::MilestoneUnlocked { .. } => "milestone-unlocked",
            Self::RecoveryStarted { .. } => "recovery-started",
            Self::RecoveryProgressed { .. } => "recovery-progressed",
            Self::RecoveryCompleted { .. } => "recovery-completed",
            Self::ChallengeStarted { .. } => "challenge-started",
            Self::ChallengeRolledOver { .. } => "challenge-rolled-over",
            Self::ChallengeDayMarked { .. } => "challenge-day-marked",
            Self::ChallengeCelebration { .. } => "challenge-celebration",
            Self::BadgeEarned { .. } => "badge-earned",
        }
    }
}
