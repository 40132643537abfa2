//! Week rollover synchronization and day marking.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;

use super::catalog::ChallengeCatalog;
use super::{ChallengeHistoryEntry, ChallengeInstance, ChallengeState, IsoWeek};
use crate::error::ValidationError;
use crate::storage::config::ChallengeConfig;

/// Scoring of one finished week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekScore {
    pub days_completed: usize,
    pub full_complete: bool,
    pub partial: bool,
    pub xp_earned: u32,
    pub badge_earned: Option<String>,
}

impl WeekScore {
    /// Counts towards completed challenges and the weekly streak.
    pub fn qualifies(&self) -> bool {
        self.partial || self.full_complete
    }
}

/// Outcome of a sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncOutcome {
    Unchanged,
    Started {
        challenge_id: String,
        week: IsoWeek,
    },
    RolledOver {
        finalized: ChallengeHistoryEntry,
        next: Option<ChallengeInstance>,
    },
}

/// Advisory payload for a week finished early. Never credits XP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Celebration {
    pub challenge_id: String,
    pub bonus_xp: u32,
    pub badge_id: Option<String>,
}

/// Outcome of marking a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayMark {
    NoActiveChallenge,
    AlreadyRecorded { days_completed: usize },
    Recorded { day: u8, days_completed: usize },
    FullCompletion { day: u8, celebration: Celebration },
}

/// Keeps a learner's [`ChallengeState`] aligned with the current ISO week.
#[derive(Debug, Clone)]
pub struct ChallengeSynchronizer {
    config: ChallengeConfig,
    catalog: ChallengeCatalog,
    offset: FixedOffset,
}

impl ChallengeSynchronizer {
    pub fn new(catalog: ChallengeCatalog) -> Self {
        Self::with_config(ChallengeConfig::default(), catalog)
    }

    pub fn with_config(config: ChallengeConfig, catalog: ChallengeCatalog) -> Self {
        Self {
            config,
            catalog,
            offset: Utc.fix(),
        }
    }

    /// Calendar offset used to turn `now` into a local date.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn catalog(&self) -> &ChallengeCatalog {
        &self.catalog
    }

    fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Score `instance` as a finished week.
    ///
    /// If the challenge is no longer in the catalog the week still earns the
    /// per-day rate but no bonus and no badge.
    pub fn score(&self, instance: &ChallengeInstance) -> WeekScore {
        let days_completed = instance
            .completed_days
            .iter()
            .filter(|d| (1..=7).contains(*d))
            .count();
        let full_complete = days_completed == 7;
        let partial = days_completed >= self.config.partial_days;
        let per_day = (days_completed as u32).saturating_mul(self.config.per_day_xp);

        let (xp_earned, badge_earned) = match self.catalog.get(&instance.challenge_id) {
            Some(entry) if full_complete => (entry.bonus_xp, entry.badge_id.clone()),
            Some(entry) if partial => (
                (self.config.partial_ratio * entry.bonus_xp as f64).round() as u32,
                None,
            ),
            _ => (per_day, None),
        };

        WeekScore {
            days_completed,
            full_complete,
            partial,
            xp_earned,
            badge_earned,
        }
    }

    fn instantiate(&self, week: IsoWeek, today: NaiveDate) -> Option<ChallengeInstance> {
        let entry = self.catalog.for_week(week.week)?;
        Some(ChallengeInstance {
            challenge_id: entry.id.clone(),
            week,
            start_date: week.monday().unwrap_or(today),
            completed_days: Default::default(),
        })
    }

    /// Align `state` with the week containing `now`.
    ///
    /// On a week change the outgoing instance is scored, recorded and its XP
    /// added to `total_xp`. A `now` in an earlier week than the active
    /// instance leaves everything untouched.
    pub fn sync(
        &self,
        state: &mut ChallengeState,
        total_xp: &mut u64,
        now: DateTime<Utc>,
    ) -> SyncOutcome {
        let today = self.local_date(now);
        let week = IsoWeek::of(today);

        let Some(active) = state.active.as_ref() else {
            return match self.instantiate(week, today) {
                Some(instance) => {
                    tracing::info!(challenge_id = %instance.challenge_id, week = week.week, "weekly challenge started");
                    let outcome = SyncOutcome::Started {
                        challenge_id: instance.challenge_id.clone(),
                        week,
                    };
                    state.active = Some(instance);
                    outcome
                }
                None => SyncOutcome::Unchanged,
            };
        };

        if active.week >= week {
            if active.week > week {
                tracing::debug!(active = ?active.week, now = ?week, "clock behind active challenge week");
            }
            return SyncOutcome::Unchanged;
        }

        let outgoing = active.clone();
        let score = self.score(&outgoing);
        let finalized = ChallengeHistoryEntry {
            challenge_id: outgoing.challenge_id.clone(),
            week: outgoing.week,
            completed_days: outgoing.completed_days.clone(),
            completed_at: now,
            xp_earned: score.xp_earned,
            full_complete: score.full_complete,
            partial: score.partial,
            badge_earned: score.badge_earned.clone(),
        };

        let stats = &mut state.stats;
        if score.qualifies() {
            stats.total_completed += 1;
            stats.current_weekly_streak += 1;
        } else {
            stats.current_weekly_streak = 0;
        }
        stats.best_weekly_streak = stats.best_weekly_streak.max(stats.current_weekly_streak);
        if outgoing.week.weeks_until(week).is_some_and(|gap| gap > 1) {
            // Whole weeks without an instance count as missed.
            stats.current_weekly_streak = 0;
        }

        *total_xp = total_xp.saturating_add(u64::from(score.xp_earned));
        state.history.push(finalized.clone());
        state.active = self.instantiate(week, today);

        tracing::info!(
            challenge_id = %finalized.challenge_id,
            days = score.days_completed,
            xp = score.xp_earned,
            full = score.full_complete,
            "weekly challenge rolled over"
        );

        SyncOutcome::RolledOver {
            finalized,
            next: state.active.clone(),
        }
    }

    /// Record challenge day `day` (1 = Monday ... 7 = Sunday).
    ///
    /// Reaching seven days returns an advisory celebration; XP and badges
    /// are only granted at rollover.
    pub fn mark_day(&self, state: &mut ChallengeState, day: u8) -> Result<DayMark, ValidationError> {
        if !(1..=7).contains(&day) {
            return Err(ValidationError::InvalidChallengeDay { day });
        }
        let Some(active) = state.active.as_mut() else {
            return Ok(DayMark::NoActiveChallenge);
        };
        if !active.completed_days.insert(day) {
            return Ok(DayMark::AlreadyRecorded {
                days_completed: active.completed_days.len(),
            });
        }

        let days_completed = active.completed_days.len();
        tracing::debug!(challenge_id = %active.challenge_id, day, days_completed, "challenge day marked");
        if days_completed == 7 {
            let entry = self.catalog.get(&active.challenge_id);
            return Ok(DayMark::FullCompletion {
                day,
                celebration: Celebration {
                    challenge_id: active.challenge_id.clone(),
                    bonus_xp: entry.map_or(0, |e| e.bonus_xp),
                    badge_id: entry.and_then(|e| e.badge_id.clone()),
                },
            });
        }
        Ok(DayMark::Recorded {
            day,
            days_completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::WeeklyChallenge;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn catalog() -> ChallengeCatalog {
        ChallengeCatalog::new(vec![
            WeeklyChallenge {
                id: "even".into(),
                title: "Even".into(),
                description: String::new(),
                bonus_xp: 200,
                badge_id: Some("even-badge".into()),
            },
            WeeklyChallenge {
                id: "odd".into(),
                title: "Odd".into(),
                description: String::new(),
                bonus_xp: 150,
                badge_id: Some("odd-badge".into()),
            },
        ])
    }

    /// Noon UTC on the given date.
    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    /// Active instance in ISO week 2 of 2024 ("even") with `days` marked.
    fn week_two_with(days: &[u8]) -> ChallengeState {
        ChallengeState {
            active: Some(ChallengeInstance {
                challenge_id: "even".into(),
                week: IsoWeek { year: 2024, week: 2 },
                start_date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
                completed_days: days.iter().copied().collect(),
            }),
            ..Default::default()
        }
    }

    fn rolled(outcome: SyncOutcome) -> ChallengeHistoryEntry {
        match outcome {
            SyncOutcome::RolledOver { finalized, .. } => finalized,
            other => panic!("expected rollover, got {other:?}"),
        }
    }

    #[test]
    fn first_sync_starts_the_week_challenge() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = ChallengeState::default();
        let mut xp = 0;
        let outcome = sync.sync(&mut state, &mut xp, noon(2024, 1, 10));
        assert_eq!(
            outcome,
            SyncOutcome::Started {
                challenge_id: "even".into(),
                week: IsoWeek { year: 2024, week: 2 }
            }
        );
        let active = state.active.unwrap();
        assert_eq!(active.start_date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert!(active.completed_days.is_empty());
        assert_eq!(xp, 0);
    }

    #[test]
    fn same_week_sync_is_a_no_op() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = week_two_with(&[1, 2]);
        let before = state.clone();
        let mut xp = 0;
        assert_eq!(sync.sync(&mut state, &mut xp, noon(2024, 1, 14)), SyncOutcome::Unchanged);
        assert_eq!(state, before);
    }

    #[test]
    fn full_week_earns_bonus_and_badge() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = week_two_with(&[1, 2, 3, 4, 5, 6, 7]);
        let mut xp = 100;
        let entry = rolled(sync.sync(&mut state, &mut xp, noon(2024, 1, 15)));
        assert!(entry.full_complete);
        assert_eq!(entry.xp_earned, 200);
        assert_eq!(entry.badge_earned.as_deref(), Some("even-badge"));
        assert_eq!(xp, 300);
        assert_eq!(state.stats.total_completed, 1);
        assert_eq!(state.stats.current_weekly_streak, 1);
        assert_eq!(state.stats.best_weekly_streak, 1);

        let next = state.active.as_ref().unwrap();
        assert_eq!(next.week, IsoWeek { year: 2024, week: 3 });
        assert_eq!(next.challenge_id, "odd");
        assert!(next.completed_days.is_empty());
    }

    #[test]
    fn five_days_earn_partial_credit() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = week_two_with(&[1, 2, 3, 4, 5]);
        let mut xp = 0;
        let entry = rolled(sync.sync(&mut state, &mut xp, noon(2024, 1, 16)));
        assert!(entry.partial);
        assert!(!entry.full_complete);
        assert_eq!(entry.xp_earned, 150);
        assert_eq!(entry.badge_earned, None);
        assert_eq!(state.stats.total_completed, 1);
    }

    #[test]
    fn partial_credit_rounds() {
        let sync = ChallengeSynchronizer::new(ChallengeCatalog::new(vec![WeeklyChallenge {
            id: "even".into(),
            title: String::new(),
            description: String::new(),
            bonus_xp: 175,
            badge_id: None,
        }]));
        let state = week_two_with(&[1, 2, 3, 4, 5, 6]);
        // 0.75 * 175 = 131.25
        assert_eq!(sync.score(state.active.as_ref().unwrap()).xp_earned, 131);
    }

    #[test]
    fn two_days_earn_per_day_xp_and_reset_streak() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = week_two_with(&[1, 2]);
        state.stats.current_weekly_streak = 4;
        state.stats.best_weekly_streak = 4;
        let mut xp = 0;
        let entry = rolled(sync.sync(&mut state, &mut xp, noon(2024, 1, 15)));
        assert_eq!(entry.xp_earned, 50);
        assert!(!entry.partial);
        assert!(!entry.full_complete);
        assert_eq!(state.stats.current_weekly_streak, 0);
        assert_eq!(state.stats.best_weekly_streak, 4);
        assert_eq!(state.stats.total_completed, 0);
    }

    #[test]
    fn xp_is_credited_once_per_rollover() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = week_two_with(&[1, 2, 3, 4, 5, 6, 7]);
        let mut xp = 0;
        sync.sync(&mut state, &mut xp, noon(2024, 1, 15));
        sync.sync(&mut state, &mut xp, noon(2024, 1, 15));
        sync.sync(&mut state, &mut xp, noon(2024, 1, 17));
        assert_eq!(xp, 200);
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn earlier_clock_never_moves_the_week_backwards() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = week_two_with(&[1]);
        let mut xp = 0;
        assert_eq!(sync.sync(&mut state, &mut xp, noon(2024, 1, 2)), SyncOutcome::Unchanged);
        assert_eq!(state.active.unwrap().week.week, 2);
    }

    #[test]
    fn skipped_weeks_reset_the_weekly_streak_after_scoring() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = week_two_with(&[1, 2, 3, 4, 5, 6, 7]);
        state.stats.current_weekly_streak = 2;
        state.stats.best_weekly_streak = 2;
        let mut xp = 0;
        // Week 5 of 2024.
        rolled(sync.sync(&mut state, &mut xp, noon(2024, 1, 31)));
        assert_eq!(state.stats.best_weekly_streak, 3);
        assert_eq!(state.stats.current_weekly_streak, 0);
        assert_eq!(state.active.unwrap().week.week, 5);
    }

    #[test]
    fn retired_challenge_scores_per_day_without_badge() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = week_two_with(&[1, 2, 3, 4, 5, 6, 7]);
        state.active.as_mut().unwrap().challenge_id = "retired".into();
        let mut xp = 0;
        let entry = rolled(sync.sync(&mut state, &mut xp, noon(2024, 1, 15)));
        assert!(entry.full_complete);
        assert_eq!(entry.xp_earned, 175);
        assert_eq!(entry.badge_earned, None);
    }

    #[test]
    fn oversized_rates_and_totals_saturate() {
        let config = ChallengeConfig {
            per_day_xp: u32::MAX,
            ..Default::default()
        };
        let sync = ChallengeSynchronizer::with_config(config, catalog());
        let mut state = week_two_with(&[1, 2, 3, 4, 5, 6, 7]);
        state.active.as_mut().unwrap().challenge_id = "retired".into();
        let mut xp = u64::MAX - 10;
        let entry = rolled(sync.sync(&mut state, &mut xp, noon(2024, 1, 15)));
        assert_eq!(entry.xp_earned, u32::MAX);
        assert_eq!(xp, u64::MAX);
    }

    #[test]
    fn utc_offset_decides_the_week() {
        // Sunday 2024-01-14 23:30 in UTC-2 is already Monday in UTC.
        let offset = FixedOffset::west_opt(2 * 3600).unwrap();
        let sync = ChallengeSynchronizer::new(catalog()).with_offset(offset);
        let mut state = week_two_with(&[]);
        let mut xp = 0;
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 1, 30, 0).unwrap();
        assert_eq!(sync.sync(&mut state, &mut xp, now), SyncOutcome::Unchanged);
    }

    #[test]
    fn mark_day_rejects_out_of_range() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = week_two_with(&[]);
        assert_eq!(
            sync.mark_day(&mut state, 0),
            Err(ValidationError::InvalidChallengeDay { day: 0 })
        );
        assert!(sync.mark_day(&mut state, 8).is_err());
    }

    #[test]
    fn mark_day_is_a_no_op_without_instance_or_when_repeated() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut empty = ChallengeState::default();
        assert_eq!(sync.mark_day(&mut empty, 3), Ok(DayMark::NoActiveChallenge));

        let mut state = week_two_with(&[3]);
        assert_eq!(
            sync.mark_day(&mut state, 3),
            Ok(DayMark::AlreadyRecorded { days_completed: 1 })
        );
        assert_eq!(
            sync.mark_day(&mut state, 4),
            Ok(DayMark::Recorded {
                day: 4,
                days_completed: 2
            })
        );
    }

    #[test]
    fn seventh_day_celebrates_without_crediting() {
        let sync = ChallengeSynchronizer::new(catalog());
        let mut state = week_two_with(&[1, 2, 3, 4, 5, 6]);
        let mark = sync.mark_day(&mut state, 7).unwrap();
        assert_eq!(
            mark,
            DayMark::FullCompletion {
                day: 7,
                celebration: Celebration {
                    challenge_id: "even".into(),
                    bonus_xp: 200,
                    badge_id: Some("even-badge".into()),
                }
            }
        );
        assert!(state.history.is_empty());
        assert_eq!(
            state.active.unwrap().completed_days,
            (1..=7).collect::<BTreeSet<u8>>()
        );
    }
}
