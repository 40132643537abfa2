//! Per-invocation state shared by the commands.

use std::error::Error;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use pawstreak_core::{Config, Curriculum, Database, EngagementEngine, EngagementState, StateRepository};
use serde::Serialize;

const STARTER_CURRICULUM: &str = include_str!("../assets/curriculum.json");

/// kv key holding the learner picked with `learner use`.
pub const CURRENT_LEARNER_KEY: &str = "current_learner";

pub type CliResult = Result<(), Box<dyn Error>>;

pub struct Context {
    pub db: Database,
    pub learner: String,
    pub now: DateTime<Utc>,
    curriculum: Option<PathBuf>,
}

impl Context {
    pub fn new(
        learner: Option<String>,
        curriculum: Option<PathBuf>,
        now: Option<&str>,
    ) -> Result<Self, Box<dyn Error>> {
        let now = match now {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map_err(|e| format!("invalid --now '{raw}': {e}"))?
                .with_timezone(&Utc),
            None => Utc::now(),
        };
        let db = Database::open()?;
        let learner = match learner {
            Some(id) => id,
            None => db
                .kv_get(CURRENT_LEARNER_KEY)?
                .unwrap_or_else(|| "default".to_string()),
        };
        tracing::debug!(%learner, %now, "cli context ready");
        Ok(Self {
            db,
            learner,
            now,
            curriculum,
        })
    }

    pub fn engine(&self) -> Result<EngagementEngine, Box<dyn Error>> {
        let config = Config::load()?;
        let curriculum = match &self.curriculum {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read curriculum {}: {e}", path.display()))?;
                Curriculum::from_json(&json)?
            }
            None => Curriculum::from_json(STARTER_CURRICULUM)?,
        };
        Ok(EngagementEngine::new(config, curriculum))
    }

    pub fn load_state(&self) -> Result<EngagementState, Box<dyn Error>> {
        Ok(self.db.load_or_new(&self.learner)?)
    }

    pub fn save_state(&self, state: &EngagementState) -> CliResult {
        self.db.save(state)?;
        Ok(())
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
