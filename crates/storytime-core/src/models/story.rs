use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de;

/// A story as returned by the API. Only the fields the client acts on are
/// typed; everything else the server sends is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Story {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "de::url_list")]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Story {
    /// Name of the embedded category object, if the endpoint includes one.
    pub fn category_name(&self) -> Option<&str> {
        self.extra.get("category")?.get("name")?.as_str()
    }

    /// Name of the embedded author object, if the endpoint includes one.
    pub fn author_name(&self) -> Option<&str> {
        self.extra.get("user")?.get("name")?.as_str()
    }

    pub fn created_at(&self) -> Option<&str> {
        self.extra.get("created_at")?.as_str()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A saved association between the token's user and a story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub story: Option<Story>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bookmark {
    pub fn story_id(&self) -> Option<&str> {
        self.story.as_ref()?.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_story_keeps_unknown_fields() {
        let json = r#"{
            "id": 7,
            "title": "The Dragon",
            "category_id": "3",
            "content": "Once upon a time",
            "cover": "http://img/cover.png",
            "images": ["http://img/1.png"],
            "category": {"id": 3, "name": "Fantasy"},
            "user": {"name": "Ayu"},
            "created_at": "2024-11-02T10:00:00.000000Z"
        }"#;
        let story: Story = serde_json::from_str(json).expect("story should parse");
        assert_eq!(story.id.as_deref(), Some("7"));
        assert_eq!(story.category_id.as_deref(), Some("3"));
        assert_eq!(story.images, vec!["http://img/1.png"]);
        assert_eq!(story.category_name(), Some("Fantasy"));
        assert_eq!(story.author_name(), Some("Ayu"));
        assert_eq!(story.created_at(), Some("2024-11-02T10:00:00.000000Z"));
    }

    #[test]
    fn test_parse_sparse_story() {
        let story: Story = serde_json::from_str(r#"{"id": 1, "title": null}"#).unwrap();
        assert_eq!(story.id.as_deref(), Some("1"));
        assert_eq!(story.title, "");
        assert!(story.images.is_empty());
        assert!(story.cover.is_none());
        assert_eq!(story.category_name(), None);
    }

    #[test]
    fn test_bookmark_story_id() {
        let bookmark: Bookmark =
            serde_json::from_str(r#"{"id": 2, "story": {"id": 42, "title": "x"}}"#).unwrap();
        assert_eq!(bookmark.story_id(), Some("42"));

        let orphan: Bookmark = serde_json::from_str(r#"{"id": 3, "story": null}"#).unwrap();
        assert_eq!(orphan.story_id(), None);
    }
}
