use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses a block height from a JSON value.
///
/// Registry documents are hand-edited, so heights show up as integers, floats with
/// no fractional part, decimal strings, or not at all. Anything unusable maps to `0`,
/// which downstream code treats as "no valid upgrade".
#[must_use]
pub fn parse_height(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|v| i64::try_from(v).ok()))
            .or_else(|| {
                n.as_f64().filter(|f| f.fract() == 0.0 && f.is_finite()).map(|f| f as i64)
            })
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

/// Serde adapter for [`parse_height`].
///
/// # Errors
///
/// Only fails if the input is not valid JSON at all.
pub fn deserialize_height<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(0, parse_height))
}

/// Parses an RFC 3339 timestamp, falling back to the current time.
///
/// Upgrade times are estimates. A malformed one should not discard the rest of the
/// record, so the fallback is logged and the record is kept.
#[must_use]
pub fn parse_timestamp_or_now(raw: Option<&str>, context: &str) -> DateTime<Utc> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => match DateTime::parse_from_rfc3339(text) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!(
                    context = context,
                    value = text,
                    error = %e,
                    "unparsable upgrade time, using current time"
                );
                Utc::now()
            }
        },
        None => Utc::now(),
    }
}
