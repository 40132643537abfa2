//! Configuration and learner state persistence.

pub mod config;
pub mod database;

pub use config::Config;
pub use database::Database;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{ConfigError, Result, StorageError};
use crate::state::EngagementState;

/// Returns the data directory, creating it if needed.
///
/// `PAWSTREAK_DATA_DIR` wins when set. Otherwise `~/.config/pawstreak`, or
/// `~/.config/pawstreak-dev` when `PAWSTREAK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::result::Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("PAWSTREAK_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("PAWSTREAK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pawstreak-dev")
            } else {
                base_dir.join("pawstreak")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Whole-blob storage of learner states.
///
/// `save` replaces the stored state in one unit; a reader never sees a
/// half-applied update.
pub trait StateRepository {
    fn load(&self, learner_id: &str) -> Result<Option<EngagementState>>;

    fn save(&self, state: &EngagementState) -> Result<()>;

    /// Stored learner ids, sorted.
    fn learners(&self) -> Result<Vec<String>>;

    /// Stored state, or a fresh one for an unknown learner.
    fn load_or_new(&self, learner_id: &str) -> Result<EngagementState> {
        Ok(self
            .load(learner_id)?
            .unwrap_or_else(|| EngagementState::new(learner_id)))
    }
}

pub(crate) fn decode_state(learner_id: &str, json: &str) -> Result<EngagementState> {
    serde_json::from_str(json).map_err(|e| {
        StorageError::CorruptState {
            learner_id: learner_id.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Repository kept in process memory. States are stored serialized so that
/// loads hand out independent copies.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    states: Mutex<BTreeMap<String, String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateRepository for MemoryRepository {
    fn load(&self, learner_id: &str) -> Result<Option<EngagementState>> {
        let states = self.states.lock().map_err(|_| StorageError::Locked)?;
        states
            .get(learner_id)
            .map(|json| decode_state(learner_id, json))
            .transpose()
    }

    fn save(&self, state: &EngagementState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        let mut states = self.states.lock().map_err(|_| StorageError::Locked)?;
        states.insert(state.learner_id.clone(), json);
        Ok(())
    }

    fn learners(&self) -> Result<Vec<String>> {
        let states = self.states.lock().map_err(|_| StorageError::Locked)?;
        Ok(states.keys().cloned().collect())
    }
}
