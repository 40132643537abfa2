//! # Pawstreak Core Library
//!
//! Engagement state for a dog-training practice app. The CLI is a thin layer
//! over this crate; everything that decides what a learner sees lives here.
//!
//! ## Architecture
//!
//! - **Freshness**: exponential decay of per-exercise practice confidence
//! - **Daily plan**: prioritized practice list from freshness and progress
//! - **Streaks**: daily continuity with freeze tokens, milestones and recovery
//! - **Challenges**: weekly challenge rotated on ISO week boundaries, scored
//!   and credited exactly once at rollover
//! - **Badges**: one-time achievements evaluated from aggregate stats
//! - **Storage**: TOML configuration and SQLite learner state blobs
//!
//! Every time-dependent operation takes `now` from the caller. Nothing in
//! this crate reads the system clock on the engine path.
//!
//! ## Key Components
//!
//! - [`EngagementEngine`]: facade applying all transitions to an
//!   [`EngagementState`]
//! - [`Database`]: learner state persistence
//! - [`Config`]: engine configuration

pub mod badges;
pub mod catalog;
pub mod challenge;
pub mod engine;
pub mod error;
pub mod events;
pub mod freshness;
mod lenient;
pub mod plan;
pub mod state;
pub mod storage;
pub mod streak;

pub use badges::{evaluate_new_badges, AggregateStats, BadgeCatalog, BadgeDefinition, BadgeRule};
pub use catalog::{Curriculum, Exercise, LifeStage, Program};
pub use challenge::{ChallengeCatalog, ChallengeState, ChallengeSynchronizer, IsoWeek};
pub use engine::EngagementEngine;
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::{EngagementEvent, XpSource};
pub use freshness::{compute_freshness, Freshness, FreshnessLabel, SkillFreshnessRecord};
pub use plan::{select_daily_plan, PlanInput, PlanItem, PlanReason};
pub use state::{EngagementState, LearnerTotals};
pub use storage::{Config, Database, MemoryRepository, StateRepository};
pub use streak::{StreakEngine, StreakState};
