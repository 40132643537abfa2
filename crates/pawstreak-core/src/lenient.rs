//! Forgiving deserializers for stored dates.
//!
//! A persisted date that cannot be parsed reads back as `None`, so one bad
//! field never rejects a whole learner document. Use together with
//! `#[serde(default)]` so missing fields also read as `None`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn parse_or_none<T: std::str::FromStr>(value: Option<Value>, field: &'static str) -> Option<T> {
    let value = value?;
    let parsed = value.as_str().and_then(|s| s.parse().ok());
    if parsed.is_none() && !value.is_null() {
        tracing::warn!(field, value = %value, "ignoring unparseable stored date");
    }
    parsed
}

pub(crate) fn datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_or_none(Option::<Value>::deserialize(deserializer)?, "timestamp"))
}

pub(crate) fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_or_none(Option::<Value>::deserialize(deserializer)?, "date"))
}
