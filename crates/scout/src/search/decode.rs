//! Tolerant field decoders for backend payloads.
//!
//! The search backend is loosely typed: scores arrive as floats, timestamps
//! without an offset, and optional strings as `null`. A record that is
//! otherwise usable must not fail to decode over any of these.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// `null` decodes as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any JSON number, rounded and clamped to 0..=100; `null` is 0.
pub(crate) fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<f64>::deserialize(deserializer)?.unwrap_or_default();
  Ok(clamp_percent(value))
}

pub(crate) fn clamp_percent(value: f64) -> u8 {
  if value.is_nan() {
    return 0;
  }
  value.round().clamp(0.0, 100.0) as u8
}

/// RFC 3339, or a naive timestamp read as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
    return Some(ts.with_timezone(&Utc));
  }
  NAIVE_FORMATS
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    .map(|naive| naive.and_utc())
}

/// Missing, `null` or unparseable timestamps fall back to now.
pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(optional_timestamp(deserializer)?.unwrap_or_else(Utc::now))
}

pub(crate) fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<String>::deserialize(deserializer)?;
  Ok(raw.as_deref().and_then(|raw| {
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
      tracing::debug!("ignoring unparseable timestamp {raw:?}");
    }
    parsed
  }))
}
