//! Response envelopes
//!
//! List and detail routes wrap their payload in a named key
//! (`{"projects": [...]}`, `{"professional": {...}}`) on some backend
//! versions and return it bare on others.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Decode `value[key]` when present, the bare value otherwise.
pub fn extract<T: DeserializeOwned>(value: Value, key: &str) -> Result<T, ApiError> {
    let inner = match value {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(inner).map_err(|e| ApiError::decode(key, e))
}

/// Like [`extract`], tries each key in turn.
pub fn extract_any<T: DeserializeOwned>(value: Value, keys: &[&str]) -> Result<T, ApiError> {
    if let Value::Object(map) = &value {
        if let Some(key) = keys.iter().find(|k| map.contains_key(**k)) {
            return extract(value, key);
        }
    }
    let context = keys.first().copied().unwrap_or("response");
    serde_json::from_value(value).map_err(|e| ApiError::decode(context, e))
}

/// Lists answered with `null` decode as empty.
pub fn extract_list<T: DeserializeOwned>(value: Value, key: &str) -> Result<Vec<T>, ApiError> {
    let list: Option<Vec<T>> = extract(value, key)?;
    Ok(list.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapped_and_bare() {
        let wrapped: Vec<String> = extract(json!({"statuses": ["A", "B"]}), "statuses").unwrap();
        let bare: Vec<String> = extract(json!(["A", "B"]), "statuses").unwrap();
        assert_eq!(wrapped, bare);
    }

    #[test]
    fn test_extract_any_picks_first_present_key() {
        let types: Vec<String> =
            extract_any(json!({"document_types": ["x"]}), &["types", "document_types"]).unwrap();
        assert_eq!(types, vec!["x"]);
    }

    #[test]
    fn test_null_list_is_empty() {
        let list: Vec<String> = extract_list(json!({"projects": null}), "projects").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_decode_error_names_key() {
        let err = extract::<Vec<u32>>(json!({"projects": "nope"}), "projects").unwrap_err();
        assert!(err.to_string().contains("projects"));
    }
}
