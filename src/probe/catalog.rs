//! Model-listing response parsing
//!
//! Providers answer `GET <versioned_base>/models` in a few shapes:
//! the OpenAI `{"data": [...]}` envelope, a bare JSON array, and elements that
//! are either plain id strings or objects with an `id` field.

use serde_json::Value;

/// Extract model ids from a model-listing body
///
/// Unknown shapes yield an empty list rather than an error; the listing is
/// diagnostic only.
pub fn parse_model_catalog(body: &Value) -> Vec<String> {
    let entries = match body {
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Vec::new(),
        },
        Value::Array(items) => items.as_slice(),
        _ => return Vec::new(),
    };

    entries.iter().filter_map(model_id).collect()
}

fn model_id(entry: &Value) -> Option<String> {
    match entry {
        Value::String(id) => Some(id.clone()),
        Value::Object(map) => match map.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(other) if !other.is_null() => Some(other.to_string()),
            _ => None,
        },
        _ => None,
    }
}
