use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signed-in user's profile as the API returns it.
///
/// The client does not validate a schema: the profile is an arbitrary JSON
/// object that is stored and restored as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a profile from any JSON value; only objects qualify.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look a key up at the top level, falling back to a nested `data` object
    /// for endpoints that wrap the profile.
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.0
            .get(key)
            .or_else(|| self.0.get("data")?.get(key))
    }

    pub fn name(&self) -> Option<&str> {
        self.lookup("name")?.as_str()
    }

    pub fn email(&self) -> Option<&str> {
        self.lookup("email")?.as_str()
    }

    pub fn id(&self) -> Option<String> {
        match self.lookup("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for UserProfile {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_accessors() {
        let profile = UserProfile::from_value(json!({
            "id": 12,
            "name": "Sari",
            "email": "sari@example.com",
            "bio": null
        }))
        .expect("object should convert");
        assert_eq!(profile.id().as_deref(), Some("12"));
        assert_eq!(profile.name(), Some("Sari"));
        assert_eq!(profile.email(), Some("sari@example.com"));
        assert_eq!(profile.get("bio"), Some(&Value::Null));
    }

    #[test]
    fn test_profile_wrapped_in_data() {
        let profile =
            UserProfile::from_value(json!({"status": 200, "data": {"name": "Budi"}})).unwrap();
        assert_eq!(profile.name(), Some("Budi"));
        assert_eq!(profile.email(), None);
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(UserProfile::from_value(json!([1, 2])).is_none());
        assert!(serde_json::from_str::<UserProfile>("\"text\"").is_err());
    }
}
