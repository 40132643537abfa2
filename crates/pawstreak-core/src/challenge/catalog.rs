//! Ordered weekly challenge catalog and its rotation.
//!
//! The rotation is `week mod catalog_size`. Inserting or removing an entry
//! shifts every learner's future rotation, so entries are only appended.

use serde::{Deserialize, Serialize};

/// One week-long challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyChallenge {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub bonus_xp: u32,
    #[serde(default)]
    pub badge_id: Option<String>,
}

/// Catalog index active in ISO week `iso_week`; `None` for an empty catalog.
pub fn active_challenge_index(iso_week: u32, catalog_size: usize) -> Option<usize> {
    if catalog_size == 0 {
        return None;
    }
    Some(iso_week as usize % catalog_size)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeCatalog {
    pub entries: Vec<WeeklyChallenge>,
}

fn entry(id: &str, title: &str, description: &str, bonus_xp: u32, badge: &str) -> WeeklyChallenge {
    WeeklyChallenge {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        bonus_xp,
        badge_id: Some(badge.to_string()),
    }
}

impl ChallengeCatalog {
    pub fn new(entries: Vec<WeeklyChallenge>) -> Self {
        Self { entries }
    }

    /// The catalog shipped with the app.
    pub fn standard() -> Self {
        Self::new(vec![
            entry("recall-rally", "Recall Rally", "Practice recall every day", 200, "recall-champion"),
            entry("calm-canine", "Calm Canine", "Daily settle and relaxation work", 150, "zen-dog"),
            entry("trick-week", "Trick Week", "Learn or polish a trick each day", 250, "trick-master"),
            entry("loose-leash", "Loose Leash", "A loose-leash walk every day", 200, "leash-legend"),
            entry("focus-frenzy", "Focus Frenzy", "Eye contact and focus games", 150, "focus-champion"),
            entry("social-butterfly", "Social Butterfly", "Calm exposure to new things", 200, "social-butterfly"),
            entry("brain-games", "Brain Games", "Daily enrichment puzzle", 175, "brainiac"),
            entry("manners-marathon", "Manners Marathon", "Polite greetings and waits", 200, "good-citizen"),
        ])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_for_week(&self, iso_week: u32) -> Option<usize> {
        active_challenge_index(iso_week, self.entries.len())
    }

    pub fn for_week(&self, iso_week: u32) -> Option<&WeeklyChallenge> {
        self.index_for_week(iso_week).and_then(|i| self.entries.get(i))
    }

    pub fn get(&self, challenge_id: &str) -> Option<&WeeklyChallenge> {
        self.entries.iter().find(|c| c.id == challenge_id)
    }
}

impl Default for ChallengeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
