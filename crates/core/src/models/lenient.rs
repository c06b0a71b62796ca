//! Field deserializers that never fail the surrounding record.
//!
//! Used with `#[serde(deserialize_with = "...")]` on record fields. A value
//! of an unexpected shape becomes `None` (or `false`) and the rest of the
//! record still decodes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    Value::deserialize(deserializer)
}

/// Any deserializable value; mismatched shapes become `None`.
///
/// # Errors
///
/// Only fails when the underlying deserializer itself fails.
pub fn value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match raw(deserializer)? {
        Value::Null => None,
        other => serde_json::from_value(other)
            .inspect_err(|error| tracing::debug!(%error, "defaulting field that failed to decode"))
            .ok(),
    })
}

/// Text, accepting numbers and booleans as their printed form.
///
/// # Errors
///
/// Only fails when the underlying deserializer itself fails.
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match raw(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// A finite number, accepting numeric strings such as `"20"`.
///
/// # Errors
///
/// Only fails when the underlying deserializer itself fails.
pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let parsed = match raw(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|n| n.is_finite()))
}

/// A non-negative integer, accepting numeric strings.
///
/// # Errors
///
/// Only fails when the underlying deserializer itself fails.
pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(match raw(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// A boolean, accepting `0`/`1` and `"true"`/`"false"`.
///
/// # Errors
///
/// Only fails when the underlying deserializer itself fails.
pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(truthy(&raw(deserializer)?))
}

/// Like [`flag`], with anything unreadable meaning `false`.
///
/// # Errors
///
/// Only fails when the underlying deserializer itself fails.
pub fn flag_or_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(truthy(&raw(deserializer)?).unwrap_or(false))
}

/// A list whose elements are decoded one by one; bad elements are dropped.
///
/// # Errors
///
/// Only fails when the underlying deserializer itself fails.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match raw(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
