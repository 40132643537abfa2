//! Streak transitions: break-check, training day, recovery.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::milestones::{MilestoneUnlock, MILESTONES};
use super::{RecoveryState, StreakHistoryEntry, StreakState};
use crate::storage::config::StreakConfig;

/// Outcome of a break-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreakCheck {
    Unchanged,
    /// One missed day was forgiven.
    FreezeUsed { streak: u32, freezes_remaining: u32 },
    /// The streak ended.
    Broken { previous: u32, best: u32 },
}

/// Outcome of logging a training day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    /// False when the day was already counted.
    pub counted: bool,
    pub current: u32,
    pub milestones: Vec<MilestoneUnlock>,
}

/// Outcome of a recovery day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveryProgress {
    Inactive,
    AlreadyCounted,
    Progressed { days: u32, target: u32 },
    Completed { days: u32 },
}

/// Applies streak transitions according to a [`StreakConfig`].
#[derive(Debug, Clone, Default)]
pub struct StreakEngine {
    config: StreakConfig,
}

impl StreakEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StreakConfig) -> Self {
        Self { config }
    }

    /// Compare the last training day with `today`.
    ///
    /// - gap <= 1: nothing happens
    /// - gap == 2 with a freeze available: the freeze is spent, streak kept
    /// - otherwise: the streak breaks and is written to history
    ///
    /// Repeating the check on the same day is a no-op.
    pub fn check(&self, state: &mut StreakState, today: NaiveDate) -> StreakCheck {
        let Some(gap) = state.days_since_training(today) else {
            return StreakCheck::Unchanged;
        };
        if state.current == 0 || gap <= 1 {
            return StreakCheck::Unchanged;
        }

        if gap == 2 {
            if state.freezes.last_used_date == Some(today) {
                return StreakCheck::Unchanged;
            }
            if state.freezes.available > 0 {
                state.freezes.available -= 1;
                state.freezes.total_used += 1;
                state.freezes.last_used_date = Some(today);
                tracing::info!(
                    streak = state.current,
                    freezes_remaining = state.freezes.available,
                    "streak freeze used"
                );
                return StreakCheck::FreezeUsed {
                    streak: state.current,
                    freezes_remaining: state.freezes.available,
                };
            }
        }

        let previous = state.current;
        state.best = state.best.max(previous);
        state.history.push(StreakHistoryEntry {
            streak: previous,
            start_date: state.start_date,
            end_date: state.last_training_date,
            broken_date: today,
        });
        state.current = 0;
        state.start_date = None;
        state.recovery = RecoveryState::default();

        tracing::info!(previous, best = state.best, gap, "streak broken");
        StreakCheck::Broken {
            previous,
            best: state.best,
        }
    }

    /// Count `today` as a training day. Only the first call per day counts.
    ///
    /// Callers run [`StreakEngine::check`] first so that a stale streak is
    /// broken before it is extended.
    pub fn record_training_day(&self, state: &mut StreakState, today: NaiveDate) -> StreakUpdate {
        if state.last_training_date.is_some_and(|last| last >= today) {
            tracing::debug!(%today, "training day already counted");
            return StreakUpdate {
                counted: false,
                current: state.current,
                milestones: Vec::new(),
            };
        }

        state.current += 1;
        if state.current == 1 {
            state.start_date = Some(today);
        }
        state.last_training_date = Some(today);
        state.best = state.best.max(state.current);

        let milestones = self.unlock_milestones(state);
        StreakUpdate {
            counted: true,
            current: state.current,
            milestones,
        }
    }

    fn unlock_milestones(&self, state: &mut StreakState) -> Vec<MilestoneUnlock> {
        let mut unlocked = Vec::new();
        for (days, reward) in MILESTONES {
            if state.current < days || !state.milestones_unlocked.insert(days) {
                continue;
            }
            if reward.freezes > 0 {
                let cap = self.config.max_freezes.max(state.freezes.available);
                state.freezes.available = (state.freezes.available + reward.freezes).min(cap);
            }
            tracing::info!(days, xp = reward.xp, "streak milestone unlocked");
            unlocked.push(MilestoneUnlock { days, reward });
        }
        unlocked
    }

    /// Begin a recovery run after a break.
    pub fn start_recovery(&self, state: &mut StreakState, now: DateTime<Utc>) {
        state.recovery = RecoveryState {
            active: true,
            days_completed: 0,
            start_date: Some(now),
            last_day: None,
        };
        tracing::info!("streak recovery started");
    }

    /// Count a qualifying practice day towards an active recovery.
    pub fn record_recovery_day(&self, state: &mut StreakState, today: NaiveDate) -> RecoveryProgress {
        if !state.recovery.active {
            return RecoveryProgress::Inactive;
        }
        if state.recovery.last_day.is_some_and(|d| d >= today) {
            return RecoveryProgress::AlreadyCounted;
        }

        state.recovery.days_completed += 1;
        state.recovery.last_day = Some(today);
        let days = state.recovery.days_completed;
        let target = self.config.recovery_target_days.max(1);

        if days >= target {
            state.recovery.active = false;
            state.recoveries_completed += 1;
            tracing::info!(days, "streak recovery completed");
            RecoveryProgress::Completed { days }
        } else {
            RecoveryProgress::Progressed { days, target }
        }
    }
}
