//! Tolerant unwrapping of backend response envelopes.
//!
//! Backend endpoints disagree on how they wrap payloads: a bare array,
//! `{ "data": [...] }`, `{ "data": { "data": [...] } }`,
//! `{ "data": { "hoardings": [...] } }`, `{ "items": [...] }` and so on.
//! The functions here resolve all of these to the innermost intended value
//! and degrade to an empty list or `None` instead of failing.
//!
//! # Resolution order
//!
//! The envelope chain is the payload followed by each nested `data` value.
//! Levels are examined innermost first. For lists, at each level:
//!
//! 1. the level itself, if it is an array
//! 2. the caller-supplied key (e.g. `hoardings`)
//! 3. one of [`LIST_KEYS`]
//! 4. one of [`COLLECTION_KEYS`]
//!
//! Arrays under any other key are ignored.
//!
//! For single records: the caller-supplied key, then one of
//! [`RECORD_KEYS`], then the innermost level itself if it is a non-empty
//! object. Outer wrappers are never returned as the record.

use serde_json::Value;

/// Keys that conventionally hold a list.
pub const LIST_KEYS: &[&str] = &["items", "results", "rows", "records", "list"];

/// Collection names used by backend resources.
pub const COLLECTION_KEYS: &[&str] = &[
    "hoardings",
    "bookings",
    "tokens",
    "contracts",
    "proposals",
    "enquiries",
    "clients",
    "notifications",
    "tasks",
    "checkins",
    "rents",
    "users",
    "roles",
];

/// Keys that conventionally hold a single record.
pub const RECORD_KEYS: &[&str] = &["item", "record", "result"];

/// Keys that carry a human-readable status message.
const MESSAGE_KEYS: &[&str] = &["message", "error", "msg"];

/// Maximum envelope depth followed.
const MAX_DEPTH: usize = 8;

/// The payload and every nested `data` value, outermost first.
fn chain(payload: &Value) -> Vec<&Value> {
    let mut levels = vec![payload];
    let mut current = payload;
    while levels.len() < MAX_DEPTH {
        match current.get("data") {
            Some(inner) if !inner.is_null() => {
                levels.push(inner);
                current = inner;
            }
            _ => break,
        }
    }
    levels
}

fn list_at<'a>(level: &'a Value, key: Option<&str>) -> Option<&'a Vec<Value>> {
    if let Value::Array(items) = level {
        return Some(items);
    }
    let object = level.as_object()?;

    key.into_iter()
        .chain(LIST_KEYS.iter().copied())
        .chain(COLLECTION_KEYS.iter().copied())
        .find_map(|k| object.get(k).and_then(Value::as_array))
}

fn record_at<'a>(level: &'a Value, key: Option<&str>, innermost: bool) -> Option<&'a Value> {
    let object = level.as_object()?;

    key.into_iter()
        .chain(RECORD_KEYS.iter().copied())
        .find_map(|k| object.get(k).filter(|v| v.is_object()))
        .or_else(|| (innermost && !object.is_empty()).then_some(level))
}

/// Extract a list from any known envelope shape.
///
/// Returns an empty vector when no list can be found.
///
/// ```
/// use hoarding_core::envelope::extract_list;
/// use serde_json::json;
///
/// let payload = json!({"data": {"data": {"hoardings": [{"id": "h1"}]}}});
/// assert_eq!(extract_list(&payload), vec![json!({"id": "h1"})]);
/// assert!(extract_list(&json!(null)).is_empty());
/// ```
#[must_use]
pub fn extract_list(payload: &Value) -> Vec<Value> {
    extract_list_named(payload, None)
}

/// Extract a list, preferring `key` at each envelope level.
#[must_use]
pub fn extract_list_named(payload: &Value, key: Option<&str>) -> Vec<Value> {
    chain(payload)
        .into_iter()
        .rev()
        .find_map(|level| list_at(level, key))
        .cloned()
        .unwrap_or_else(|| {
            tracing::debug!(key, "no list found in response envelope");
            Vec::new()
        })
}

/// Extract a single record from any known envelope shape.
///
/// Returns `None` when the payload holds no object (null, scalars, arrays,
/// empty objects).
#[must_use]
pub fn extract_one(payload: &Value) -> Option<Value> {
    extract_one_named(payload, None)
}

/// Extract a single record, preferring `key` at each envelope level.
#[must_use]
pub fn extract_one_named(payload: &Value, key: Option<&str>) -> Option<Value> {
    let levels = chain(payload);
    let innermost = levels.len() - 1;
    levels
        .into_iter()
        .enumerate()
        .rev()
        .find_map(|(depth, level)| record_at(level, key, depth == innermost))
        .cloned()
}

/// Find a human-readable message (`message`, `error`, `msg`) at any level.
///
/// Used for success and error toasts.
#[must_use]
pub fn envelope_message(payload: &Value) -> Option<String> {
    chain(payload).into_iter().find_map(|level| {
        let object = level.as_object()?;
        MESSAGE_KEYS.iter().find_map(|k| match object.get(*k) {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
            Some(Value::Object(inner)) => inner
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        })
    })
}

/// Find a string field under any envelope level, trying `keys` in order.
#[must_use]
pub fn find_string(payload: &Value, keys: &[&str]) -> Option<String> {
    chain(payload).into_iter().rev().find_map(|level| {
        let object = level.as_object()?;
        keys.iter().find_map(|k| {
            object
                .get(*k)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        })
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_inputs() {
        assert!(extract_list(&Value::Null).is_empty());
        assert!(extract_list(&json!({})).is_empty());
        assert!(extract_list(&json!("oops")).is_empty());
        assert!(extract_list(&json!({"data": null})).is_empty());
        assert!(extract_list(&json!({"data": {"count": 3}})).is_empty());
    }

    #[test]
    fn test_bare_array() {
        assert_eq!(extract_list(&json!([1, 2])), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_data_array() {
        assert_eq!(extract_list(&json!({"data": [{"id": 1}]})), vec![json!({"id": 1})]);
    }

    #[test]
    fn test_double_wrapped_named_key() {
        let payload = json!({"data": {"data": {"hoardings": [{"id": "h1"}]}}});
        assert_eq!(extract_list(&payload), vec![json!({"id": "h1"})]);
        assert_eq!(
            extract_list_named(&payload, Some("hoardings")),
            vec![json!({"id": "h1"})]
        );
    }

    #[test]
    fn test_innermost_wins() {
        let payload = json!({
            "items": [{"id": "outer"}],
            "data": {"items": [{"id": "inner"}]}
        });
        assert_eq!(extract_list(&payload), vec![json!({"id": "inner"})]);
    }

    #[test]
    fn test_named_key_beats_conventional_keys() {
        let payload = json!({"data": {"items": [1], "bookings": [2]}});
        assert_eq!(extract_list_named(&payload, Some("bookings")), vec![json!(2)]);
        assert_eq!(extract_list(&payload), vec![json!(1)]);
    }

    #[test]
    fn test_unknown_keys_fall_outward() {
        let payload = json!({
            "results": [{"id": "r"}],
            "data": {"a": [1], "b": [2]}
        });
        assert_eq!(extract_list(&payload), vec![json!({"id": "r"})]);
        assert!(extract_list(&json!({"data": {"a": [1], "b": [2]}})).is_empty());
    }

    #[test]
    fn test_array_at_unknown_key_is_not_a_list() {
        assert!(extract_list(&json!({"data": {"count": 3, "tags": ["a"]}})).is_empty());
        assert!(extract_list_named(&json!({"data": {"tags": ["a"]}}), Some("hoardings")).is_empty());
    }

    #[test]
    fn test_collection_key_without_caller_hint() {
        let payload = json!({"data": {"notifications": [{"id": "n1"}], "unread": 1}});
        assert_eq!(extract_list(&payload), vec![json!({"id": "n1"})]);
    }

    #[test]
    fn test_paginated_shape() {
        let payload = json!({"success": true, "data": {"rows": [{"id": 9}], "total": 1}});
        assert_eq!(extract_list(&payload), vec![json!({"id": 9})]);
    }

    #[test]
    fn test_extract_one_shapes() {
        assert_eq!(extract_one(&json!({"data": {"id": 1}})), Some(json!({"id": 1})));
        assert_eq!(
            extract_one(&json!({"data": {"data": {"id": 2}}})),
            Some(json!({"id": 2}))
        );
        assert_eq!(
            extract_one_named(&json!({"data": {"hoarding": {"id": 3}}}), Some("hoarding")),
            Some(json!({"id": 3}))
        );
        assert_eq!(
            extract_one(&json!({"result": {"id": 4}, "success": true})),
            Some(json!({"id": 4}))
        );
    }

    #[test]
    fn test_extract_one_empty() {
        assert_eq!(extract_one(&Value::Null), None);
        assert_eq!(extract_one(&json!({})), None);
        assert_eq!(extract_one(&json!([{"id": 1}])), None);
        assert_eq!(extract_one(&json!({"data": {}})), None);
        assert_eq!(extract_one(&json!({"data": [{"id": 1}]})), None);
    }

    #[test]
    fn test_envelope_message() {
        assert_eq!(
            envelope_message(&json!({"success": false, "message": "Hoarding already booked"})),
            Some("Hoarding already booked".to_string())
        );
        assert_eq!(
            envelope_message(&json!({"error": {"message": "Invalid token"}})),
            Some("Invalid token".to_string())
        );
        assert_eq!(envelope_message(&json!({"message": "  "})), None);
        assert_eq!(envelope_message(&Value::Null), None);
    }

    #[test]
    fn test_find_string_through_envelopes() {
        let payload = json!({"data": {"accessToken": "new", "refreshToken": "r2"}});
        assert_eq!(
            find_string(&payload, &["accessToken", "token"]),
            Some("new".to_string())
        );
        assert_eq!(find_string(&json!({"token": ""}), &["token"]), None);
    }
}
