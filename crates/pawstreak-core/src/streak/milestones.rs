//! Fixed streak milestone table.

use serde::Serialize;

/// Reward attached to a streak milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MilestoneReward {
    pub xp: u32,
    /// Freeze tokens granted (subject to the configured cap).
    pub freezes: u32,
    pub title: &'static str,
}

/// A milestone crossed for the first time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MilestoneUnlock {
    pub days: u32,
    pub reward: MilestoneReward,
}

const fn reward(xp: u32, freezes: u32, title: &'static str) -> MilestoneReward {
    MilestoneReward { xp, freezes, title }
}

/// Milestones in ascending order of streak length.
pub const MILESTONES: [(u32, MilestoneReward); 11] = [
    (3, reward(30, 0, "Getting Started")),
    (7, reward(70, 1, "One Week Wonder")),
    (14, reward(140, 1, "Two Week Trooper")),
    (21, reward(210, 0, "Habit Formed")),
    (30, reward(300, 1, "Monthly Master")),
    (45, reward(450, 0, "Dedicated Duo")),
    (60, reward(600, 1, "Two Month Champion")),
    (90, reward(900, 1, "Quarter Legend")),
    (120, reward(1200, 0, "Unstoppable")),
    (180, reward(1800, 1, "Half Year Hero")),
    (365, reward(3650, 2, "Year of Training")),
];

/// Reward for an exact milestone length, if it is one.
pub fn milestone_reward(days: u32) -> Option<MilestoneReward> {
    MILESTONES
        .iter()
        .find(|(d, _)| *d == days)
        .map(|(_, reward)| *reward)
}

/// The next milestone strictly above `current`.
pub fn next_milestone(current: u32) -> Option<u32> {
    MILESTONES.iter().map(|(d, _)| *d).find(|d| *d > current)
}
