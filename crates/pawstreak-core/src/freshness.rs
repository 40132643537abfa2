//! Skill freshness: exponential decay of practice confidence.
//!
//! `freshness = exp(-days_since / interval_days)`, labelled fresh (>= 0.6),
//! fading (>= 0.3) or stale. The caller always supplies `now`.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::config::FreshnessConfig;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Discrete freshness label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessLabel {
    Fresh,
    Fading,
    Stale,
}

impl FreshnessLabel {
    pub fn from_score(score: f64, config: &FreshnessConfig) -> Self {
        if score >= config.fresh_threshold {
            FreshnessLabel::Fresh
        } else if score >= config.fading_threshold {
            FreshnessLabel::Fading
        } else {
            FreshnessLabel::Stale
        }
    }
}

/// Per-exercise practice record. Created on first completion, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFreshnessRecord {
    pub exercise_id: String,
    /// Unparseable stored values read as `None`, so the skill reads stale.
    #[serde(default, deserialize_with = "crate::lenient::datetime")]
    pub last_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub interval_days: f64,
    #[serde(default)]
    pub completions: u32,
}

/// Freshness assessment of one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Freshness {
    pub score: f64,
    pub label: FreshnessLabel,
}

impl Freshness {
    fn stale() -> Self {
        Self {
            score: 0.0,
            label: FreshnessLabel::Stale,
        }
    }
}

/// Compute the decayed freshness of `record` at `now`.
///
/// A missing timestamp yields freshness 0. A timestamp in the future counts
/// as "just practiced". Non-finite or non-positive intervals fall back to
/// the configured default.
pub fn compute_freshness(
    record: &SkillFreshnessRecord,
    now: DateTime<Utc>,
    config: &FreshnessConfig,
) -> Freshness {
    let Some(last) = record.last_completed_at else {
        return Freshness::stale();
    };

    let interval = effective_interval(record.interval_days, config);
    let days_since = ((now - last).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY).max(0.0);
    let score = (-days_since / interval).exp();
    if !score.is_finite() {
        return Freshness::stale();
    }
    let score = score.clamp(0.0, 1.0);

    Freshness {
        score,
        label: FreshnessLabel::from_score(score, config),
    }
}

fn effective_interval(interval_days: f64, config: &FreshnessConfig) -> f64 {
    if interval_days.is_finite() && interval_days > 0.0 {
        interval_days
    } else if config.default_interval_days.is_finite() && config.default_interval_days > 0.0 {
        config.default_interval_days
    } else {
        3.0
    }
}

/// Record a completion of `exercise_id` at `now`, creating the record on
/// first completion.
pub fn record_completion<'a>(
    records: &'a mut BTreeMap<String, SkillFreshnessRecord>,
    exercise_id: &str,
    now: DateTime<Utc>,
    config: &FreshnessConfig,
) -> &'a SkillFreshnessRecord {
    let record = records
        .entry(exercise_id.to_string())
        .or_insert_with(|| SkillFreshnessRecord {
            exercise_id: exercise_id.to_string(),
            last_completed_at: None,
            interval_days: effective_interval(config.default_interval_days, config),
            completions: 0,
        });

    if record.completions > 0 {
        let grown = effective_interval(record.interval_days, config) * config.interval_growth.max(1.0);
        let cap = config.max_interval_days.max(effective_interval(0.0, config));
        record.interval_days = grown.min(cap);
    } else {
        record.interval_days = effective_interval(record.interval_days, config);
    }
    record.completions += 1;
    record.last_completed_at = Some(now);

    tracing::debug!(
        exercise_id,
        completions = record.completions,
        interval_days = record.interval_days,
        "freshness record updated"
    );
    record
}

/// Assess every record at `now`.
pub fn assess_all(
    records: &BTreeMap<String, SkillFreshnessRecord>,
    now: DateTime<Utc>,
    config: &FreshnessConfig,
) -> HashMap<String, Freshness> {
    records
        .iter()
        .map(|(id, record)| (id.clone(), compute_freshness(record, now, config)))
        .collect()
}
