//! Curriculum catalog: programs, levels and exercises.
//!
//! The catalog is immutable content supplied by the caller (usually loaded
//! from JSON). Program order and level order are significant: the daily plan
//! walks them in catalog order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Life stage classification of a learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Puppy,
    Adolescent,
    Adult,
    Senior,
}

impl LifeStage {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "puppy" => Some(Self::Puppy),
            "adolescent" => Some(Self::Adolescent),
            "adult" => Some(Self::Adult),
            "senior" => Some(Self::Senior),
            _ => None,
        }
    }
}

/// Exercise difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// A single practice exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Stages this exercise applies to. `None` means every stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_stages: Option<BTreeSet<LifeStage>>,
}

impl Exercise {
    /// Whether the exercise can be offered to a learner in `stage`.
    ///
    /// Untagged exercises suit every stage, and a learner whose stage is not
    /// classified yet is offered everything.
    pub fn suits(&self, stage: Option<LifeStage>) -> bool {
        match (&self.life_stages, stage) {
            (Some(stages), Some(stage)) => stages.contains(&stage),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// 1-based level number within the program.
    pub number: u32,
    pub exercises: Vec<Exercise>,
}

impl Level {
    /// A level is complete when every stage-applicable exercise is done.
    pub fn is_complete(&self, completed: &BTreeSet<String>, stage: Option<LifeStage>) -> bool {
        self.exercises
            .iter()
            .filter(|e| e.suits(stage))
            .all(|e| completed.contains(&e.id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Minimum player level required to see this program.
    #[serde(default)]
    pub unlock_level: u32,
    pub levels: Vec<Level>,
}

impl Program {
    pub fn is_unlocked(&self, player_level: u32) -> bool {
        player_level >= self.unlock_level
    }

    pub fn is_complete(&self, completed: &BTreeSet<String>, stage: Option<LifeStage>) -> bool {
        !self.levels.is_empty() && self.levels.iter().all(|l| l.is_complete(completed, stage))
    }
}

/// Where an exercise lives in the curriculum.
#[derive(Debug, Clone, Copy)]
pub struct ExerciseLocation<'a> {
    pub program: &'a Program,
    pub level: &'a Level,
    pub exercise: &'a Exercise,
}

/// Ordered curriculum catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub programs: Vec<Program>,
}

impl Curriculum {
    pub fn new(programs: Vec<Program>) -> Self {
        Self { programs }
    }

    /// Parse a curriculum from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Locate an exercise by id. The first occurrence in catalog order wins.
    pub fn find_exercise(&self, exercise_id: &str) -> Option<ExerciseLocation<'_>> {
        self.programs.iter().find_map(|program| {
            program.levels.iter().find_map(|level| {
                level
                    .exercises
                    .iter()
                    .find(|e| e.id == exercise_id)
                    .map(|exercise| ExerciseLocation {
                        program,
                        level,
                        exercise,
                    })
            })
        })
    }

    pub fn contains_exercise(&self, exercise_id: &str) -> bool {
        self.find_exercise(exercise_id).is_some()
    }

    /// Programs visible at `player_level`, in catalog order.
    pub fn unlocked_programs(&self, player_level: u32) -> impl Iterator<Item = &Program> {
        self.programs
            .iter()
            .filter(move |p| p.is_unlocked(player_level))
    }

    /// Number of fully completed levels across all programs.
    pub fn completed_levels(&self, completed: &BTreeSet<String>, stage: Option<LifeStage>) -> u32 {
        self.programs
            .iter()
            .flat_map(|p| p.levels.iter())
            .filter(|l| !l.exercises.is_empty() && l.is_complete(completed, stage))
            .count() as u32
    }

    /// Ids of fully completed programs.
    pub fn completed_programs(
        &self,
        completed: &BTreeSet<String>,
        stage: Option<LifeStage>,
    ) -> BTreeSet<String> {
        self.programs
            .iter()
            .filter(|p| p.is_complete(completed, stage))
            .map(|p| p.id.clone())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn exercise(id: &str) -> Exercise {
        Exercise {
            id: id.to_string(),
            name: id.replace('-', " "),
            duration_minutes: 5,
            difficulty: Difficulty::Beginner,
            life_stages: None,
        }
    }

    pub fn staged(id: &str, stages: &[LifeStage]) -> Exercise {
        Exercise {
            life_stages: Some(stages.iter().copied().collect()),
            ..exercise(id)
        }
    }

    pub fn level(number: u32, ids: &[&str]) -> Level {
        Level {
            number,
            exercises: ids.iter().map(|id| exercise(id)).collect(),
        }
    }

    /// Two programs: "foundations" (open) and "tricks" (unlock level 3).
    pub fn curriculum() -> Curriculum {
        Curriculum::new(vec![
            Program {
                id: "foundations".into(),
                name: "Foundations".into(),
                unlock_level: 0,
                levels: vec![
                    level(1, &["sit", "down", "name-game"]),
                    level(2, &["stay", "leave-it"]),
                    level(3, &["recall", "heel"]),
                ],
            },
            Program {
                id: "tricks".into(),
                name: "Tricks".into(),
                unlock_level: 3,
                levels: vec![level(1, &["spin", "paw"]), level(2, &["roll-over"])],
            },
        ])
    }
}
