//! TOML-based engine configuration.
//!
//! Holds the tunables of the engagement engine:
//! - Freshness decay interval and label thresholds
//! - Daily plan size and fallback sampling seed
//! - Streak freeze cap and recovery target
//! - Weekly challenge partial-credit scoring
//! - Session XP and the learner's calendar offset
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::plan::MAX_PLAN_ITEMS;

/// Freshness decay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessConfig {
    /// Interval used when a record has none (or a non-positive one).
    #[serde(default = "default_interval_days")]
    pub default_interval_days: f64,
    #[serde(default = "default_fresh_threshold")]
    pub fresh_threshold: f64,
    #[serde(default = "default_fading_threshold")]
    pub fading_threshold: f64,
    /// Multiplier applied to a skill's interval on each repeat completion.
    /// 1.0 keeps intervals fixed.
    #[serde(default = "default_interval_growth")]
    pub interval_growth: f64,
    #[serde(default = "default_max_interval_days")]
    pub max_interval_days: f64,
}

/// Daily plan configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Cap on `needs_review` items.
    #[serde(default = "default_max_review_items")]
    pub max_review_items: usize,
    /// Seed for the empty-plan fallback sample (None = entropy).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Streak configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Freezes granted by milestones never push `available` above this.
    #[serde(default = "default_max_freezes")]
    pub max_freezes: u32,
    #[serde(default = "default_recovery_target_days")]
    pub recovery_target_days: u32,
}

/// Weekly challenge scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// XP per completed day when the week earns no partial credit.
    #[serde(default = "default_per_day_xp")]
    pub per_day_xp: u32,
    /// Days needed for partial credit.
    #[serde(default = "default_partial_days")]
    pub partial_days: usize,
    /// Share of the bonus paid for partial credit.
    #[serde(default = "default_partial_ratio")]
    pub partial_ratio: f64,
}

/// XP configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpConfig {
    #[serde(default = "default_session_xp")]
    pub per_session: u32,
}

/// Calendar configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CalendarConfig {
    /// Learner's offset from UTC, used to derive calendar days from `now`.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl CalendarConfig {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).unwrap_or(Utc.fix())
    }
}

/// Engine configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub freshness: FreshnessConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub challenge: ChallengeConfig,
    #[serde(default)]
    pub xp: XpConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

// Default functions
fn default_interval_days() -> f64 {
    3.0
}
fn default_fresh_threshold() -> f64 {
    0.6
}
fn default_fading_threshold() -> f64 {
    0.3
}
fn default_interval_growth() -> f64 {
    1.0
}
fn default_max_interval_days() -> f64 {
    30.0
}
fn default_max_items() -> usize {
    3
}
fn default_max_review_items() -> usize {
    2
}
fn default_max_freezes() -> u32 {
    3
}
fn default_recovery_target_days() -> u32 {
    3
}
fn default_per_day_xp() -> u32 {
    25
}
fn default_partial_days() -> usize {
    5
}
fn default_partial_ratio() -> f64 {
    0.75
}
fn default_session_xp() -> u32 {
    10
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            default_interval_days: default_interval_days(),
            fresh_threshold: default_fresh_threshold(),
            fading_threshold: default_fading_threshold(),
            interval_growth: default_interval_growth(),
            max_interval_days: default_max_interval_days(),
        }
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            max_review_items: default_max_review_items(),
            seed: None,
        }
    }
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            max_freezes: default_max_freezes(),
            recovery_target_days: default_recovery_target_days(),
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            per_day_xp: default_per_day_xp(),
            partial_days: default_partial_days(),
            partial_ratio: default_partial_ratio(),
        }
    }
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            per_session: default_session_xp(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
        optional_keys: &[&str],
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let optional = optional_keys.contains(&key);
                let existing = match obj.get(part) {
                    Some(v) => v.clone(),
                    None if optional => serde_json::Value::Null,
                    None => return Err(unknown()),
                };

                if optional && value.eq_ignore_ascii_case("none") {
                    obj.insert(part.to_string(), serde_json::Value::Null);
                    return Ok(());
                }

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) | serde_json::Value::Null => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or holds out-of-range
    /// values.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value, &["plan.seed"])?;
        let updated: Self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check cross-field ranges the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message,
            })
        };

        let fresh = &self.freshness;
        if !(fresh.default_interval_days.is_finite() && fresh.default_interval_days > 0.0) {
            return invalid("freshness.default_interval_days", "must be a positive number".into());
        }
        if !(0.0..=1.0).contains(&fresh.fresh_threshold) {
            return invalid("freshness.fresh_threshold", "must be within [0, 1]".into());
        }
        if !(0.0..=fresh.fresh_threshold).contains(&fresh.fading_threshold) {
            return invalid(
                "freshness.fading_threshold",
                format!("must be within [0, {}]", fresh.fresh_threshold),
            );
        }
        if !(fresh.interval_growth.is_finite() && fresh.interval_growth >= 1.0) {
            return invalid("freshness.interval_growth", "must be at least 1.0".into());
        }
        if !(fresh.max_interval_days.is_finite() && fresh.max_interval_days > 0.0) {
            return invalid("freshness.max_interval_days", "must be a positive number".into());
        }

        if !(1..=MAX_PLAN_ITEMS).contains(&self.plan.max_items) {
            return invalid("plan.max_items", format!("must be within 1..={MAX_PLAN_ITEMS}"));
        }
        if self.plan.max_review_items > self.plan.max_items {
            return invalid(
                "plan.max_review_items",
                format!("must not exceed plan.max_items ({})", self.plan.max_items),
            );
        }

        if !(1..=7).contains(&self.challenge.partial_days) {
            return invalid("challenge.partial_days", "must be within 1..=7".into());
        }
        if !(0.0..=1.0).contains(&self.challenge.partial_ratio) {
            return invalid("challenge.partial_ratio", "must be within [0, 1]".into());
        }
        Ok(())
    }
}
