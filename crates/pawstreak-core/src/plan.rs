//! Daily plan selection.
//!
//! Builds a short, prioritized list of practice items from freshness,
//! curriculum progress and unlock state. Priority, applied in order until
//! the plan is full:
//! 1. stale skills (`needs_review`, capped)
//! 2. next unfinished exercise per unlocked program (`continue_progress`)
//! 3. fading skills (`review_reinforce`)
//! 4. if still empty, a sample of completed exercises (`review_reinforce`)
//!
//! The plan is recomputed from a snapshot whenever an input changes.

use std::collections::{BTreeSet, HashMap, HashSet};

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::catalog::{Curriculum, Exercise, LifeStage, Program};
use crate::freshness::{Freshness, FreshnessLabel};
use crate::storage::config::PlanConfig;

/// Why an item was recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanReason {
    NeedsReview,
    ContinueProgress,
    ReviewReinforce,
}

/// A recommended practice item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub exercise: Exercise,
    pub program_id: String,
    pub level: u32,
    pub reason: PlanReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness: Option<f64>,
}

/// Snapshot of everything the selector reads.
#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    pub completed: &'a BTreeSet<String>,
    pub player_level: u32,
    pub curriculum: &'a Curriculum,
    pub freshness: &'a HashMap<String, Freshness>,
    pub life_stage: Option<LifeStage>,
}

struct PlanBuilder<'a> {
    input: PlanInput<'a>,
    max_items: usize,
    items: Vec<PlanItem>,
    chosen: HashSet<String>,
}

impl<'a> PlanBuilder<'a> {
    fn is_full(&self) -> bool {
        self.items.len() >= self.max_items
    }

    /// Push an item for `exercise_id` if it is known, unchosen and there is
    /// room. Unknown ids are skipped.
    fn push(&mut self, exercise_id: &str, reason: PlanReason, freshness: Option<f64>) -> bool {
        if self.is_full() || self.chosen.contains(exercise_id) {
            return false;
        }
        let Some(loc) = self.input.curriculum.find_exercise(exercise_id) else {
            return false;
        };
        self.chosen.insert(exercise_id.to_string());
        self.items.push(PlanItem {
            exercise: loc.exercise.clone(),
            program_id: loc.program.id.clone(),
            level: loc.level.number,
            reason,
            freshness,
        });
        true
    }

    /// Exercises with `label`, most decayed first, ties by id. With `stage`
    /// set, exercises tagged for other life stages are left out.
    fn decayed(&self, label: FreshnessLabel, stage: Option<LifeStage>) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = self
            .input
            .freshness
            .iter()
            .filter(|(_, f)| f.label == label)
            .filter(|(id, _)| {
                self.input
                    .curriculum
                    .find_exercise(id)
                    .is_some_and(|loc| loc.exercise.suits(stage))
            })
            .map(|(id, f)| (id.clone(), f.score))
            .collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// First unfinished, stage-matching exercise in `program`, walking levels
    /// in order. A level is only eligible once the previous one is complete.
    fn next_in_program(&self, program: &Program) -> Option<String> {
        let stage = self.input.life_stage;
        for level in &program.levels {
            let candidate = level.exercises.iter().find(|e| {
                e.suits(stage)
                    && !self.input.completed.contains(&e.id)
                    && !self.chosen.contains(&e.id)
            });
            if let Some(exercise) = candidate {
                return Some(exercise.id.clone());
            }
            if !level.is_complete(self.input.completed, stage) {
                // Remaining work in this level is already planned.
                return None;
            }
        }
        None
    }
}

/// Upper bound on plan length, whatever the configuration says.
pub const MAX_PLAN_ITEMS: usize = 3;

/// Select today's plan. Output holds at most `config.max_items` items (never
/// more than [`MAX_PLAN_ITEMS`]) with unique exercise ids.
pub fn select_daily_plan(input: PlanInput<'_>, config: &PlanConfig) -> Vec<PlanItem> {
    let max_items = config.max_items.min(MAX_PLAN_ITEMS);
    let mut plan = PlanBuilder {
        input,
        max_items,
        items: Vec::with_capacity(max_items),
        chosen: HashSet::new(),
    };

    let mut review_count = 0;
    for (id, score) in plan.decayed(FreshnessLabel::Stale, input.life_stage) {
        if review_count >= config.max_review_items {
            break;
        }
        if plan.push(&id, PlanReason::NeedsReview, Some(score)) {
            review_count += 1;
        }
    }

    for program in input.curriculum.unlocked_programs(input.player_level) {
        if plan.is_full() {
            break;
        }
        if let Some(id) = plan.next_in_program(program) {
            plan.push(&id, PlanReason::ContinueProgress, None);
        }
    }

    // Reinforcement keeps skills the learner already has, whatever their tag.
    for (id, score) in plan.decayed(FreshnessLabel::Fading, None) {
        if plan.is_full() {
            break;
        }
        plan.push(&id, PlanReason::ReviewReinforce, Some(score));
    }

    if plan.items.is_empty() && !input.completed.is_empty() {
        // Sorted input, so a fixed seed always yields the same plan.
        let mut sample: Vec<String> = input.completed.iter().cloned().collect();
        let mut rng = match config.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        sample.shuffle(&mut rng);
        for id in sample {
            if plan.is_full() {
                break;
            }
            let freshness = input.freshness.get(&id).map(|f| f.score);
            plan.push(&id, PlanReason::ReviewReinforce, freshness);
        }
    }

    tracing::debug!(
        items = plan.items.len(),
        player_level = input.player_level,
        "daily plan selected"
    );
    plan.items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{curriculum, staged};
    use crate::catalog::{Level, Program};
    use proptest::prelude::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn fresh(entries: &[(&str, f64)]) -> HashMap<String, Freshness> {
        let config = crate::storage::config::FreshnessConfig::default();
        entries
            .iter()
            .map(|(id, score)| {
                (
                    id.to_string(),
                    Freshness {
                        score: *score,
                        label: FreshnessLabel::from_score(*score, &config),
                    },
                )
            })
            .collect()
    }

    fn seeded() -> PlanConfig {
        PlanConfig {
            seed: Some(7),
            ..Default::default()
        }
    }

    fn ids(plan: &[PlanItem]) -> Vec<&str> {
        plan.iter().map(|i| i.exercise.id.as_str()).collect()
    }

    #[test]
    fn new_learner_gets_first_exercise_of_each_open_program() {
        let c = curriculum();
        let completed = BTreeSet::new();
        let freshness = HashMap::new();
        let plan = select_daily_plan(
            PlanInput {
                completed: &completed,
                player_level: 5,
                curriculum: &c,
                freshness: &freshness,
                life_stage: None,
            },
            &seeded(),
        );
        assert_eq!(ids(&plan), vec!["sit", "spin"]);
        assert!(plan.iter().all(|i| i.reason == PlanReason::ContinueProgress));
        assert_eq!(plan[1].program_id, "tricks");
        assert_eq!(plan[1].level, 1);
    }

    #[test]
    fn stale_items_come_first_and_are_capped_at_two() {
        let c = curriculum();
        let completed = set(&["sit", "down", "name-game"]);
        let freshness = fresh(&[("sit", 0.05), ("down", 0.1), ("name-game", 0.2)]);
        let plan = select_daily_plan(
            PlanInput {
                completed: &completed,
                player_level: 1,
                curriculum: &c,
                freshness: &freshness,
                life_stage: None,
            },
            &seeded(),
        );
        assert_eq!(ids(&plan), vec!["sit", "down", "stay"]);
        assert_eq!(plan[0].reason, PlanReason::NeedsReview);
        assert_eq!(plan[1].reason, PlanReason::NeedsReview);
        assert_eq!(plan[2].reason, PlanReason::ContinueProgress);
        assert_eq!(plan[0].freshness, Some(0.05));
    }

    #[test]
    fn next_level_is_locked_until_previous_level_is_complete() {
        let c = curriculum();
        // Level 1 partially done: only "name-game" remains.
        let completed = set(&["sit", "down"]);
        let freshness = fresh(&[("sit", 0.9), ("down", 0.9)]);
        let plan = select_daily_plan(
            PlanInput {
                completed: &completed,
                player_level: 0,
                curriculum: &c,
                freshness: &freshness,
                life_stage: None,
            },
            &seeded(),
        );
        assert_eq!(ids(&plan), vec!["name-game"]);
    }

    #[test]
    fn fading_items_fill_remaining_slots() {
        let c = curriculum();
        let completed = set(&["sit", "down", "name-game"]);
        let freshness = fresh(&[("sit", 0.9), ("down", 0.45), ("name-game", 0.35)]);
        let plan = select_daily_plan(
            PlanInput {
                completed: &completed,
                player_level: 0,
                curriculum: &c,
                freshness: &freshness,
                life_stage: None,
            },
            &seeded(),
        );
        assert_eq!(ids(&plan), vec!["stay", "name-game", "down"]);
        assert_eq!(plan[1].reason, PlanReason::ReviewReinforce);
    }

    #[test]
    fn life_stage_filters_review_and_progress() {
        let mut c = curriculum();
        c.programs[0].levels[0]
            .exercises
            .insert(0, staged("puppy-socials", &[LifeStage::Puppy]));
        let completed = set(&["puppy-socials"]);
        let freshness = fresh(&[("puppy-socials", 0.01)]);
        let plan = select_daily_plan(
            PlanInput {
                completed: &completed,
                player_level: 0,
                curriculum: &c,
                freshness: &freshness,
                life_stage: Some(LifeStage::Senior),
            },
            &seeded(),
        );
        assert_eq!(ids(&plan), vec!["sit"]);
    }

    #[test]
    fn fading_reinforcement_ignores_life_stage() {
        let mut c = curriculum();
        c.programs[0].levels[0]
            .exercises
            .insert(0, staged("puppy-socials", &[LifeStage::Puppy]));
        let completed = set(&["puppy-socials"]);
        let freshness = fresh(&[("puppy-socials", 0.45)]);
        let plan = select_daily_plan(
            PlanInput {
                completed: &completed,
                player_level: 0,
                curriculum: &c,
                freshness: &freshness,
                life_stage: Some(LifeStage::Senior),
            },
            &seeded(),
        );
        assert_eq!(ids(&plan), vec!["sit", "puppy-socials"]);
        assert_eq!(plan[1].reason, PlanReason::ReviewReinforce);
    }

    #[test]
    fn oversized_config_is_capped_at_three_items() {
        let c = curriculum();
        let completed = set(&["sit", "down", "name-game"]);
        let freshness = fresh(&[("sit", 0.5), ("down", 0.45), ("name-game", 0.35)]);
        let config = PlanConfig {
            max_items: 5,
            ..seeded()
        };
        let plan = select_daily_plan(
            PlanInput {
                completed: &completed,
                player_level: 10,
                curriculum: &c,
                freshness: &freshness,
                life_stage: None,
            },
            &config,
        );
        assert_eq!(plan.len(), MAX_PLAN_ITEMS);
    }

    #[test]
    fn falls_back_to_completed_sample_when_nothing_else_qualifies() {
        let c = curriculum();
        let completed: BTreeSet<String> = c
            .programs
            .iter()
            .flat_map(|p| p.levels.iter())
            .flat_map(|l| l.exercises.iter().map(|e| e.id.clone()))
            .collect();
        let freshness = HashMap::new();
        let input = PlanInput {
            completed: &completed,
            player_level: 10,
            curriculum: &c,
            freshness: &freshness,
            life_stage: None,
        };
        let plan = select_daily_plan(input, &seeded());
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|i| i.reason == PlanReason::ReviewReinforce));

        let again = select_daily_plan(input, &seeded());
        assert_eq!(ids(&plan), ids(&again));
    }

    #[test]
    fn unknown_exercises_are_skipped() {
        let c = curriculum();
        let completed = set(&["retired-exercise"]);
        let freshness = fresh(&[("retired-exercise", 0.01)]);
        let plan = select_daily_plan(
            PlanInput {
                completed: &completed,
                player_level: 0,
                curriculum: &c,
                freshness: &freshness,
                life_stage: None,
            },
            &seeded(),
        );
        assert_eq!(ids(&plan), vec!["sit"]);
    }

    #[test]
    fn empty_learner_with_empty_catalog_gets_empty_plan() {
        let c = Curriculum::default();
        let completed = BTreeSet::new();
        let freshness = HashMap::new();
        let plan = select_daily_plan(
            PlanInput {
                completed: &completed,
                player_level: 0,
                curriculum: &c,
                freshness: &freshness,
                life_stage: None,
            },
            &seeded(),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn empty_level_does_not_block_the_program() {
        let c = Curriculum::new(vec![Program {
            id: "p".into(),
            name: String::new(),
            unlock_level: 0,
            levels: vec![
                Level {
                    number: 1,
                    exercises: vec![],
                },
                crate::catalog::fixtures::level(2, &["a"]),
            ],
        }]);
        let completed = BTreeSet::new();
        let freshness = HashMap::new();
        let plan = select_daily_plan(
            PlanInput {
                completed: &completed,
                player_level: 0,
                curriculum: &c,
                freshness: &freshness,
                life_stage: None,
            },
            &seeded(),
        );
        assert_eq!(ids(&plan), vec!["a"]);
    }

    proptest! {
        #[test]
        fn plan_is_short_unique_and_non_empty_after_any_completion(
            mask in proptest::collection::vec(any::<bool>(), 10),
            scores in proptest::collection::vec(0.0f64..1.0, 10),
            player_level in 0u32..6,
        ) {
            let c = curriculum();
            let all: Vec<String> = c
                .programs
                .iter()
                .flat_map(|p| p.levels.iter())
                .flat_map(|l| l.exercises.iter().map(|e| e.id.clone()))
                .collect();
            let completed: BTreeSet<String> = all
                .iter()
                .zip(&mask)
                .filter(|(_, m)| **m)
                .map(|(id, _)| id.clone())
                .collect();
            let freshness = fresh(
                &all.iter()
                    .zip(&scores)
                    .filter(|(id, _)| completed.contains(*id))
                    .map(|(id, s)| (id.as_str(), *s))
                    .collect::<Vec<_>>(),
            );
            let plan = select_daily_plan(
                PlanInput {
                    completed: &completed,
                    player_level,
                    curriculum: &c,
                    freshness: &freshness,
                    life_stage: None,
                },
                &seeded(),
            );
            prop_assert!(plan.len() <= 3);
            let unique: HashSet<_> = plan.iter().map(|i| i.exercise.id.clone()).collect();
            prop_assert_eq!(unique.len(), plan.len());
            if !completed.is_empty() {
                prop_assert!(!plan.is_empty());
            }
        }
    }
}
