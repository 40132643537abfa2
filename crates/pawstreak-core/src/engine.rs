//! Engagement engine: one entry point over the calculators.
//!
//! Every operation takes the learner's [`EngagementState`] and the current
//! instant explicitly, mutates the state in place and returns the events it
//! produced. Persisting the state afterwards is the caller's job.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};

use crate::badges::{evaluate_new_badges, AggregateStats, BadgeCatalog};
use crate::catalog::Curriculum;
use crate::challenge::{challenge_day, ChallengeCatalog, ChallengeSynchronizer, DayMark, SyncOutcome};
use crate::error::ValidationError;
use crate::events::{EngagementEvent, XpSource};
use crate::freshness::{self, Freshness};
use crate::plan::{select_daily_plan, PlanInput, PlanItem};
use crate::state::EngagementState;
use crate::storage::config::Config;
use crate::streak::{RecoveryProgress, StreakCheck, StreakEngine};

pub struct EngagementEngine {
    config: Config,
    curriculum: Curriculum,
    streaks: StreakEngine,
    challenges: ChallengeSynchronizer,
    badges: BadgeCatalog,
}

impl EngagementEngine {
    /// Engine with the standard challenge and badge catalogs.
    pub fn new(config: Config, curriculum: Curriculum) -> Self {
        let streaks = StreakEngine::with_config(config.streak.clone());
        let challenges = ChallengeSynchronizer::with_config(config.challenge.clone(), ChallengeCatalog::standard())
            .with_offset(config.calendar.offset());
        Self {
            config,
            curriculum,
            streaks,
            challenges,
            badges: BadgeCatalog::standard(),
        }
    }

    pub fn with_challenges(mut self, catalog: ChallengeCatalog) -> Self {
        self.challenges = ChallengeSynchronizer::with_config(self.config.challenge.clone(), catalog)
            .with_offset(self.config.calendar.offset());
        self
    }

    pub fn with_badges(mut self, catalog: BadgeCatalog) -> Self {
        self.badges = catalog;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn challenge_catalog(&self) -> &ChallengeCatalog {
        self.challenges.catalog()
    }

    pub fn badge_catalog(&self) -> &BadgeCatalog {
        &self.badges
    }

    /// Learner-local calendar date of `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.config.calendar.offset()).date_naive()
    }

    /// Streak break-check followed by challenge sync. Safe to call at any
    /// cadence; repeated calls on the same day change nothing.
    pub fn periodic_check(&self, state: &mut EngagementState, now: DateTime<Utc>) -> Vec<EngagementEvent> {
        let today = self.today(now);
        let mut events = Vec::new();

        match self.streaks.check(&mut state.streak, today) {
            StreakCheck::Unchanged => {}
            StreakCheck::FreezeUsed {
                streak,
                freezes_remaining,
            } => events.push(EngagementEvent::FreezeUsed {
                streak,
                freezes_remaining,
                on: today,
            }),
            StreakCheck::Broken { previous, best } => events.push(EngagementEvent::StreakBroken {
                previous,
                best,
                on: today,
            }),
        }

        let mut xp = state.totals.xp;
        match self.challenges.sync(&mut state.challenge, &mut xp, now) {
            SyncOutcome::Unchanged => {}
            SyncOutcome::Started { challenge_id, week } => {
                events.push(EngagementEvent::ChallengeStarted { challenge_id, week });
            }
            SyncOutcome::RolledOver { finalized, next } => {
                state.totals.xp = xp;
                events.push(EngagementEvent::ChallengeRolledOver {
                    challenge_id: finalized.challenge_id.clone(),
                    week: finalized.week,
                    days_completed: finalized.completed_days.len(),
                    xp_earned: finalized.xp_earned,
                    full_complete: finalized.full_complete,
                    partial: finalized.partial,
                    badge_earned: finalized.badge_earned.clone(),
                });
                if finalized.xp_earned > 0 {
                    events.push(EngagementEvent::XpCredited {
                        amount: finalized.xp_earned,
                        source: XpSource::Challenge,
                        total: xp,
                    });
                }
                if let Some(next) = next {
                    events.push(EngagementEvent::ChallengeStarted {
                        challenge_id: next.challenge_id,
                        week: next.week,
                    });
                }
            }
        }

        state.updated_at = Some(now);
        events
    }

    /// Record a completed practice of `exercise_id`.
    pub fn log_practice(
        &self,
        state: &mut EngagementState,
        exercise_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<EngagementEvent>, ValidationError> {
        if !self.curriculum.contains_exercise(exercise_id) {
            return Err(ValidationError::UnknownExercise(exercise_id.to_string()));
        }

        let mut events = self.periodic_check(state, now);
        let today = self.today(now);

        let completions =
            freshness::record_completion(&mut state.freshness, exercise_id, now, &self.config.freshness).completions;
        let first_completion = state.completed_exercises.insert(exercise_id.to_string());
        state.totals.sessions += 1;
        events.push(EngagementEvent::PracticeLogged {
            exercise_id: exercise_id.to_string(),
            completions,
            first_completion,
            at: now,
        });
        self.credit(state, self.config.xp.per_session, XpSource::Session, &mut events);

        let update = self.streaks.record_training_day(&mut state.streak, today);
        if update.counted {
            events.push(EngagementEvent::StreakExtended {
                current: update.current,
                on: today,
            });
        }
        for unlock in update.milestones {
            events.push(EngagementEvent::MilestoneUnlocked {
                days: unlock.days,
                xp: unlock.reward.xp,
                freezes: unlock.reward.freezes,
                title: unlock.reward.title.to_string(),
            });
            self.credit(state, unlock.reward.xp, XpSource::Milestone, &mut events);
        }

        match self.streaks.record_recovery_day(&mut state.streak, today) {
            RecoveryProgress::Inactive | RecoveryProgress::AlreadyCounted => {}
            RecoveryProgress::Progressed { days, target } => {
                events.push(EngagementEvent::RecoveryProgressed { days, target });
            }
            RecoveryProgress::Completed { days } => {
                events.push(EngagementEvent::RecoveryCompleted { days });
            }
        }

        tracing::info!(
            learner = %state.learner_id,
            exercise_id,
            sessions = state.totals.sessions,
            events = ?events.iter().map(EngagementEvent::kind).collect::<Vec<_>>(),
            "practice logged"
        );
        Ok(events)
    }

    fn credit(&self, state: &mut EngagementState, amount: u32, source: XpSource, events: &mut Vec<EngagementEvent>) {
        if amount == 0 {
            return;
        }
        let total = state.credit_xp(amount);
        events.push(EngagementEvent::XpCredited { amount, source, total });
    }

    /// Begin a recovery run. Restarting an active run resets its progress.
    pub fn start_recovery(&self, state: &mut EngagementState, now: DateTime<Utc>) -> Vec<EngagementEvent> {
        let mut events = self.periodic_check(state, now);
        self.streaks.start_recovery(&mut state.streak, now);
        events.push(EngagementEvent::RecoveryStarted { at: now });
        events
    }

    /// Mark a challenge day, defaulting to today's weekday. The state is
    /// synced to the current week first.
    pub fn mark_challenge_day(
        &self,
        state: &mut EngagementState,
        day: Option<u8>,
        now: DateTime<Utc>,
    ) -> Result<Vec<EngagementEvent>, ValidationError> {
        let day = day.unwrap_or_else(|| challenge_day(self.today(now)));
        if !(1..=7).contains(&day) {
            return Err(ValidationError::InvalidChallengeDay { day });
        }

        let mut events = self.periodic_check(state, now);
        let challenge_id = state
            .challenge
            .active
            .as_ref()
            .map(|a| a.challenge_id.clone())
            .unwrap_or_default();

        match self.challenges.mark_day(&mut state.challenge, day)? {
            DayMark::NoActiveChallenge | DayMark::AlreadyRecorded { .. } => {}
            DayMark::Recorded { day, days_completed } => events.push(EngagementEvent::ChallengeDayMarked {
                challenge_id,
                day,
                days_completed,
            }),
            DayMark::FullCompletion { day, celebration } => {
                events.push(EngagementEvent::ChallengeDayMarked {
                    challenge_id,
                    day,
                    days_completed: 7,
                });
                events.push(EngagementEvent::ChallengeCelebration {
                    challenge_id: celebration.challenge_id,
                    bonus_xp: celebration.bonus_xp,
                    badge_id: celebration.badge_id,
                });
            }
        }
        Ok(events)
    }

    /// Current freshness of every practiced exercise.
    pub fn freshness(&self, state: &EngagementState, now: DateTime<Utc>) -> BTreeMap<String, Freshness> {
        freshness::assess_all(&state.freshness, now, &self.config.freshness)
            .into_iter()
            .collect()
    }

    /// Today's plan from a snapshot of `state`.
    pub fn daily_plan(&self, state: &EngagementState, now: DateTime<Utc>) -> Vec<PlanItem> {
        let freshness = freshness::assess_all(&state.freshness, now, &self.config.freshness);
        select_daily_plan(
            PlanInput {
                completed: &state.completed_exercises,
                player_level: state.player_level,
                curriculum: &self.curriculum,
                freshness: &freshness,
                life_stage: state.life_stage,
            },
            &self.config.plan,
        )
    }

    /// Badges newly satisfied by `state`, without awarding them.
    pub fn pending_badges(&self, state: &EngagementState, flags: &BTreeSet<String>) -> BTreeSet<String> {
        let stats = AggregateStats::collect(state, &self.curriculum, flags);
        evaluate_new_badges(&self.badges, &stats, &state.earned_badges)
    }

    /// Evaluate and record newly earned badges.
    pub fn award_badges(
        &self,
        state: &mut EngagementState,
        flags: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Vec<EngagementEvent> {
        let earned = self.pending_badges(state, flags);
        let mut events = Vec::with_capacity(earned.len());
        for badge_id in earned {
            let name = self
                .badges
                .get(&badge_id)
                .map(|b| b.name.clone())
                .unwrap_or_else(|| badge_id.clone());
            tracing::info!(learner = %state.learner_id, badge_id = %badge_id, "badge earned");
            state.earned_badges.insert(badge_id.clone());
            events.push(EngagementEvent::BadgeEarned { badge_id, name, at: now });
        }
        events
    }
}
