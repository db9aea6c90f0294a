use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::de;

/// Body wrapper used by every StoryTime endpoint: `{ status, message, data }`.
///
/// `status` mirrors an HTTP code but lives in the body, so a 2xx response can
/// still carry a failure status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, deserialize_with = "de::status_code")]
    pub status: Option<u16>,
    #[serde(default, deserialize_with = "de::message_text")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_status(&self, code: u16) -> bool {
        self.status == Some(code)
    }

    /// Server message, or `fallback` when the body has none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Collect the list found at `path` inside a response body.
///
/// Descent stops early when an array is reached, and a pagination object
/// (`{ "data": [...], ... }`) at the end of the path is unwrapped, so both
/// `{data: [..]}` and `{data: {data: [..]}}` bodies yield the same list.
/// A missing or null list is empty.
pub fn extract_list<T: DeserializeOwned>(
    body: Value,
    path: &[&str],
) -> Result<Vec<T>, serde_json::Error> {
    let mut node = body;
    for key in path {
        if node.is_array() {
            break;
        }
        node = match node {
            Value::Object(mut map) => map.remove(*key).unwrap_or(Value::Null),
            _ => Value::Null,
        };
    }

    match unwrap_page(node) {
        Value::Null => Ok(Vec::new()),
        list => serde_json::from_value(list),
    }
}

fn unwrap_page(node: Value) -> Value {
    match node {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_array) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Story;
    use serde_json::json;

    #[test]
    fn test_envelope_status_and_message() {
        let env: Envelope<Value> =
            serde_json::from_value(json!({"status": "201", "message": "Created", "data": {}}))
                .unwrap();
        assert!(env.is_status(201));
        assert_eq!(env.message_or("fallback"), "Created");

        let bare: Envelope<Value> = serde_json::from_value(json!({})).unwrap();
        assert_eq!(bare.status, None);
        assert_eq!(bare.message_or("Failed to create story"), "Failed to create story");
    }

    #[test]
    fn test_extract_flat_list() {
        let body = json!({"status": 200, "data": [{"id": 1}, {"id": 2}]});
        let stories: Vec<Story> = extract_list(body, &["data"]).unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn test_extract_paginated_list() {
        let body = json!({"data": {"current_page": 1, "data": [{"id": 1, "title": "Dragon"}]}});
        let by_single: Vec<Story> = extract_list(body.clone(), &["data"]).unwrap();
        let by_double: Vec<Story> = extract_list(body, &["data", "data"]).unwrap();
        assert_eq!(by_single, by_double);
        assert_eq!(by_single[0].title, "Dragon");
    }

    #[test]
    fn test_extract_stops_at_array() {
        let body = json!({"data": [{"id": 5}]});
        let stories: Vec<Story> = extract_list(body, &["data", "data"]).unwrap();
        assert_eq!(stories.len(), 1);
    }

    #[test]
    fn test_extract_nested_category_stories() {
        let body = json!({"data": {"id": 3, "name": "Horror", "stories": {"data": [{"id": 9}]}}});
        let stories: Vec<Story> = extract_list(body, &["data", "stories", "data"]).unwrap();
        assert_eq!(stories[0].id.as_deref(), Some("9"));
    }

    #[test]
    fn test_extract_missing_is_empty() {
        let stories: Vec<Story> = extract_list(json!({"data": null}), &["data"]).unwrap();
        assert!(stories.is_empty());
        let stories: Vec<Story> = extract_list(json!({"status": 200}), &["data", "data"]).unwrap();
        assert!(stories.is_empty());
        let bad: Result<Vec<Story>, _> = extract_list(json!({"data": "nope"}), &["data"]);
        assert!(bad.is_err());
    }
}
