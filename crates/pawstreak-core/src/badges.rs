//! Badge rules and evaluation.
//!
//! A badge is awarded once. Evaluation is a pure function of an
//! [`AggregateStats`] projection and the set of badges already held; the
//! caller persists the returned ids.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::Curriculum;
use crate::challenge::ChallengeStats;
use crate::state::EngagementState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Learning,
    Streak,
    Challenge,
    Social,
}

/// Condition under which a badge is earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeRule {
    TotalXp { at_least: u64 },
    Sessions { at_least: u32 },
    ExercisesCompleted { at_least: u32 },
    LevelsCompleted { at_least: u32 },
    JournalEntries { at_least: u32 },
    Photos { at_least: u32 },
    CurrentStreak { at_least: u32 },
    BestStreak { at_least: u32 },
    FreezesUsed { at_least: u32 },
    /// Streak milestone ever reached.
    MilestoneReached { days: u32 },
    StreakRecovered { at_least: u32 },
    ChallengesCompleted { at_least: u32 },
    WeeklyStreak { at_least: u32 },
    /// A full seven-day week, of a specific challenge or any.
    ChallengeFullyCompleted {
        #[serde(default)]
        challenge_id: Option<String>,
    },
    /// Badge granted by a finalized challenge week.
    ChallengeBadge { badge_id: String },
    ProgramCompleted { program_id: String },
    /// Caller-supplied condition such as `both_trained_today`.
    Flag { name: String },
    /// Badges held before this evaluation.
    BadgesEarned { at_least: u32 },
    AllOf { rules: Vec<BadgeRule> },
}

impl BadgeRule {
    pub fn matches(&self, stats: &AggregateStats) -> bool {
        match self {
            Self::TotalXp { at_least } => stats.total_xp >= *at_least,
            Self::Sessions { at_least } => stats.sessions >= *at_least,
            Self::ExercisesCompleted { at_least } => stats.exercises_completed >= *at_least,
            Self::LevelsCompleted { at_least } => stats.levels_completed >= *at_least,
            Self::JournalEntries { at_least } => stats.journal_entries >= *at_least,
            Self::Photos { at_least } => stats.photos >= *at_least,
            Self::CurrentStreak { at_least } => stats.current_streak >= *at_least,
            Self::BestStreak { at_least } => stats.best_streak >= *at_least,
            Self::FreezesUsed { at_least } => stats.freezes_used >= *at_least,
            Self::MilestoneReached { days } => stats.milestones.contains(days),
            Self::StreakRecovered { at_least } => stats.recoveries_completed >= *at_least,
            Self::ChallengesCompleted { at_least } => stats.challenges.total_completed >= *at_least,
            Self::WeeklyStreak { at_least } => stats.challenges.best_weekly_streak >= *at_least,
            Self::ChallengeFullyCompleted { challenge_id } => match challenge_id {
                Some(id) => stats.fully_completed_challenges.contains(id),
                None => !stats.fully_completed_challenges.is_empty(),
            },
            Self::ChallengeBadge { badge_id } => stats.challenge_badges.contains(badge_id),
            Self::ProgramCompleted { program_id } => stats.completed_programs.contains(program_id),
            Self::Flag { name } => stats.flags.contains(name),
            Self::BadgesEarned { at_least } => stats.earned_badges.len() as u32 >= *at_least,
            Self::AllOf { rules } => rules.iter().all(|r| r.matches(stats)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: BadgeCategory,
    pub rule: BadgeRule,
}

/// Read-only projection of a learner's state used for evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    pub total_xp: u64,
    pub sessions: u32,
    pub exercises_completed: u32,
    pub levels_completed: u32,
    pub journal_entries: u32,
    pub photos: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub freezes_used: u32,
    pub milestones: BTreeSet<u32>,
    pub recoveries_completed: u32,
    pub challenges: ChallengeStats,
    pub fully_completed_challenges: BTreeSet<String>,
    pub challenge_badges: BTreeSet<String>,
    pub completed_programs: BTreeSet<String>,
    pub flags: BTreeSet<String>,
    pub earned_badges: BTreeSet<String>,
}

impl AggregateStats {
    pub fn collect(
        state: &EngagementState,
        curriculum: &Curriculum,
        flags: &BTreeSet<String>,
    ) -> Self {
        let completed = &state.completed_exercises;
        Self {
            total_xp: state.totals.xp,
            sessions: state.totals.sessions,
            exercises_completed: completed.len() as u32,
            levels_completed: curriculum.completed_levels(completed, state.life_stage),
            journal_entries: state.totals.journal_entries,
            photos: state.totals.photos,
            current_streak: state.streak.current,
            best_streak: state.streak.best,
            freezes_used: state.streak.freezes.total_used,
            milestones: state.streak.milestones_unlocked.clone(),
            recoveries_completed: state.streak.recoveries_completed,
            challenges: state.challenge.stats.clone(),
            fully_completed_challenges: state
                .challenge
                .history
                .iter()
                .filter(|h| h.full_complete)
                .map(|h| h.challenge_id.clone())
                .collect(),
            challenge_badges: state.challenge.earned_challenge_badges(),
            completed_programs: curriculum.completed_programs(completed, state.life_stage),
            flags: flags.clone(),
            earned_badges: state.earned_badges.clone(),
        }
    }
}

/// Ordered badge catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeCatalog {
    pub badges: Vec<BadgeDefinition>,
}

fn badge(id: &str, name: &str, description: &str, category: BadgeCategory, rule: BadgeRule) -> BadgeDefinition {
    BadgeDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        rule,
    }
}

impl BadgeCatalog {
    pub fn new(badges: Vec<BadgeDefinition>) -> Self {
        Self { badges }
    }

    pub fn standard() -> Self {
        use BadgeCategory::*;
        use BadgeRule::*;

        let challenge_badge = |id: &str, name: &str| {
            badge(id, name, "Finished the matching weekly challenge", Challenge, ChallengeBadge { badge_id: id.to_string() })
        };

        Self::new(vec![
            badge("first-steps", "First Steps", "Log your first practice session", Learning, Sessions { at_least: 1 }),
            badge("dedicated-learner", "Dedicated Learner", "Log 50 practice sessions", Learning, Sessions { at_least: 50 }),
            badge("skill-collector", "Skill Collector", "Complete 10 different exercises", Learning, ExercisesCompleted { at_least: 10 }),
            badge("level-up", "Level Up", "Finish a whole curriculum level", Learning, LevelsCompleted { at_least: 1 }),
            badge("rising-star", "Rising Star", "Earn 1000 XP", Learning, TotalXp { at_least: 1000 }),
            badge("foundations-graduate", "Foundations Graduate", "Complete the foundations program", Learning, ProgramCompleted { program_id: "foundations".to_string() }),
            badge("journal-keeper", "Journal Keeper", "Write 10 journal entries", Social, JournalEntries { at_least: 10 }),
            badge("shutterbug", "Shutterbug", "Share 25 photos", Social, Photos { at_least: 25 }),
            badge("training-buddies", "Training Buddies", "Train on the same day as a friend", Social, Flag { name: "both_trained_today".to_string() }),
            badge("week-streak", "Week Streak", "Train seven days in a row", Streak, BestStreak { at_least: 7 }),
            badge("month-streak", "Month Streak", "Train thirty days in a row", Streak, BestStreak { at_least: 30 }),
            badge("iron-will", "Iron Will", "Reach the 60 day milestone", Streak, MilestoneReached { days: 60 }),
            badge("saved-by-the-freeze", "Saved by the Freeze", "A freeze kept your streak alive", Streak, FreezesUsed { at_least: 1 }),
            badge("comeback-kid", "Comeback Kid", "Complete a streak recovery", Streak, StreakRecovered { at_least: 1 }),
            badge("challenger", "Challenger", "Complete a weekly challenge", Challenge, ChallengesCompleted { at_least: 1 }),
            badge("challenge-veteran", "Challenge Veteran", "Complete 10 weekly challenges", Challenge, ChallengesCompleted { at_least: 10 }),
            badge("weekly-warrior", "Weekly Warrior", "Complete four challenges in a row", Challenge, WeeklyStreak { at_least: 4 }),
            badge("perfect-week", "Perfect Week", "All seven days of a challenge", Challenge, ChallengeFullyCompleted { challenge_id: None }),
            challenge_badge("recall-champion", "Recall Champion"),
            challenge_badge("zen-dog", "Zen Dog"),
            challenge_badge("trick-master", "Trick Master"),
            challenge_badge("leash-legend", "Leash Legend"),
            challenge_badge("focus-champion", "Focus Champion"),
            challenge_badge("social-butterfly", "Social Butterfly"),
            challenge_badge("brainiac", "Brainiac"),
            challenge_badge("good-citizen", "Good Citizen"),
            badge("collector", "Collector", "Hold ten other badges", Learning, BadgesEarned { at_least: 10 }),
            badge(
                "overachiever",
                "Overachiever",
                "A two week streak and three completed challenges",
                Streak,
                AllOf {
                    rules: vec![BestStreak { at_least: 14 }, ChallengesCompleted { at_least: 3 }],
                },
            ),
        ])
    }

    pub fn get(&self, badge_id: &str) -> Option<&BadgeDefinition> {
        self.badges.iter().find(|b| b.id == badge_id)
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }
}

impl Default for BadgeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Ids of badges whose rule holds for `stats` and which are not already
/// earned.
pub fn evaluate_new_badges(
    catalog: &BadgeCatalog,
    stats: &AggregateStats,
    already_earned: &BTreeSet<String>,
) -> BTreeSet<String> {
    catalog
        .badges
        .iter()
        .filter(|b| !already_earned.contains(&b.id))
        .filter(|b| b.rule.matches(stats))
        .map(|b| b.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::curriculum;
    use crate::challenge::{ChallengeHistoryEntry, IsoWeek};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn ids(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn history(challenge_id: &str, full: bool, badge: Option<&str>) -> ChallengeHistoryEntry {
        ChallengeHistoryEntry {
            challenge_id: challenge_id.to_string(),
            week: IsoWeek { year: 2024, week: 10 },
            completed_days: if full { (1..=7).collect() } else { (1..=5).collect() },
            completed_at: Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap(),
            xp_earned: 100,
            full_complete: full,
            partial: true,
            badge_earned: badge.map(str::to_string),
        }
    }

    #[test]
    fn first_session_earns_first_steps() {
        let mut state = EngagementState::new("rex");
        state.totals.sessions = 1;
        let stats = AggregateStats::collect(&state, &curriculum(), &BTreeSet::new());
        let earned = evaluate_new_badges(&BadgeCatalog::standard(), &stats, &BTreeSet::new());
        assert_eq!(earned, ids(&["first-steps"]));
    }

    #[test]
    fn already_earned_badges_are_not_returned_again() {
        let mut state = EngagementState::new("rex");
        state.totals.sessions = 60;
        let catalog = BadgeCatalog::standard();
        let stats = AggregateStats::collect(&state, &curriculum(), &BTreeSet::new());

        let first = evaluate_new_badges(&catalog, &stats, &BTreeSet::new());
        assert_eq!(first, ids(&["dedicated-learner", "first-steps"]));
        let second = evaluate_new_badges(&catalog, &stats, &first);
        assert!(second.is_empty());
    }

    #[test]
    fn flag_rule_uses_caller_flags() {
        let state = EngagementState::new("rex");
        let catalog = BadgeCatalog::standard();
        let stats = AggregateStats::collect(&state, &curriculum(), &ids(&["both_trained_today"]));
        assert_eq!(
            evaluate_new_badges(&catalog, &stats, &BTreeSet::new()),
            ids(&["training-buddies"])
        );
    }

    #[test]
    fn challenge_rules_read_history() {
        let mut state = EngagementState::new("rex");
        state.challenge.history.push(history("trick-week", true, Some("trick-master")));
        state.challenge.stats.total_completed = 1;
        state.challenge.stats.best_weekly_streak = 1;
        let stats = AggregateStats::collect(&state, &curriculum(), &BTreeSet::new());

        assert!(BadgeRule::ChallengeFullyCompleted { challenge_id: Some("trick-week".into()) }.matches(&stats));
        assert!(!BadgeRule::ChallengeFullyCompleted { challenge_id: Some("recall-rally".into()) }.matches(&stats));
        let earned = evaluate_new_badges(&BadgeCatalog::standard(), &stats, &BTreeSet::new());
        assert_eq!(earned, ids(&["challenger", "perfect-week", "trick-master"]));
    }

    #[test]
    fn partial_week_gives_no_perfect_week() {
        let mut state = EngagementState::new("rex");
        state.challenge.history.push(history("calm-canine", false, None));
        let stats = AggregateStats::collect(&state, &curriculum(), &BTreeSet::new());
        assert!(!BadgeRule::ChallengeFullyCompleted { challenge_id: None }.matches(&stats));
    }

    #[test]
    fn curriculum_progress_counts_levels_and_programs() {
        let mut state = EngagementState::new("rex");
        state.completed_exercises =
            ids(&["sit", "down", "name-game", "stay", "leave-it", "recall", "heel"]);
        let stats = AggregateStats::collect(&state, &curriculum(), &BTreeSet::new());
        assert_eq!(stats.levels_completed, 3);
        assert!(stats.completed_programs.contains("foundations"));
        let earned = evaluate_new_badges(&BadgeCatalog::standard(), &stats, &BTreeSet::new());
        assert!(earned.contains("level-up"));
        assert!(earned.contains("foundations-graduate"));
    }

    #[test]
    fn all_of_needs_every_rule() {
        let rule = BadgeRule::AllOf {
            rules: vec![
                BadgeRule::BestStreak { at_least: 14 },
                BadgeRule::ChallengesCompleted { at_least: 3 },
            ],
        };
        let mut stats = AggregateStats { best_streak: 20, ..Default::default() };
        assert!(!rule.matches(&stats));
        stats.challenges.total_completed = 3;
        assert!(rule.matches(&stats));
    }

    #[test]
    fn rules_deserialize_from_tagged_json() {
        let rule: BadgeRule =
            serde_json::from_str(r#"{ "type": "milestone_reached", "days": 30 }"#).unwrap();
        assert_eq!(rule, BadgeRule::MilestoneReached { days: 30 });
        let rule: BadgeRule =
            serde_json::from_str(r#"{ "type": "challenge_fully_completed" }"#).unwrap();
        assert_eq!(rule, BadgeRule::ChallengeFullyCompleted { challenge_id: None });
    }

    #[test]
    fn collector_counts_badges_already_held() {
        let mut state = EngagementState::new("rex");
        state.earned_badges = (0..10).map(|i| format!("badge-{i}")).collect();
        let stats = AggregateStats::collect(&state, &curriculum(), &BTreeSet::new());
        let earned = evaluate_new_badges(&BadgeCatalog::standard(), &stats, &state.earned_badges);
        assert_eq!(earned, ids(&["collector"]));
    }

    #[test]
    fn standard_catalog_ids_are_unique() {
        let catalog = BadgeCatalog::standard();
        let unique: BTreeSet<_> = catalog.badges.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(unique.len(), catalog.len());
    }

    proptest! {
        #[test]
        fn evaluation_never_repeats_an_earned_badge(
            sessions in 0u32..200,
            best in 0u32..400,
            xp in 0u64..5000,
            earned_mask in proptest::collection::vec(any::<bool>(), 28),
        ) {
            let catalog = BadgeCatalog::standard();
            let already: BTreeSet<String> = catalog
                .badges
                .iter()
                .zip(earned_mask.iter().chain(std::iter::repeat(&false)))
                .filter(|(_, held)| **held)
                .map(|(b, _)| b.id.clone())
                .collect();
            let stats = AggregateStats {
                sessions,
                best_streak: best,
                current_streak: best,
                total_xp: xp,
                ..Default::default()
            };
            let new = evaluate_new_badges(&catalog, &stats, &already);
            prop_assert!(new.is_disjoint(&already));
            let mut all = already.clone();
            all.extend(new);
            prop_assert!(evaluate_new_badges(&catalog, &stats, &all).is_empty());
        }
    }
}
