//! Request-side types: files to upload and story create/update payloads.

use std::path::Path;

use serde::Serialize;

/// One file blob destined for the multipart upload endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name).first().map(|m| m.to_string());
        Self {
            file_name,
            bytes,
            content_type,
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// A story to create. Cover files are uploaded before the story is posted.
#[derive(Debug, Clone, Default)]
pub struct NewStory {
    pub title: String,
    pub category_id: String,
    pub content: String,
    pub cover: Vec<Upload>,
}

/// Changes to an existing story. Without new cover files the story keeps
/// `existing_cover`.
#[derive(Debug, Clone, Default)]
pub struct StoryUpdate {
    pub title: String,
    pub category_id: String,
    pub content: String,
    pub cover: Vec<Upload>,
    pub existing_cover: Option<String>,
}

/// JSON body sent to `POST /api/story` and `PUT /api/story/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryPayload<'a> {
    pub title: &'a str,
    pub category_id: &'a str,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub images: Vec<String>,
}

impl<'a> StoryPayload<'a> {
    /// The first uploaded URL becomes the cover (empty when nothing was
    /// uploaded); every other URL goes to `images` in upload order.
    pub fn for_create(story: &'a NewStory, urls: Vec<String>) -> Self {
        let cover = urls.first().cloned().unwrap_or_default();
        let images = urls.into_iter().filter(|url| *url != cover).collect();
        Self {
            title: &story.title,
            category_id: &story.category_id,
            content: &story.content,
            cover: Some(cover),
            images,
        }
    }

    /// A fresh upload replaces the cover; otherwise the existing cover is kept.
    pub fn for_update(update: &'a StoryUpdate, urls: Vec<String>) -> Self {
        let mut urls = urls.into_iter();
        let cover = urls.next().or_else(|| update.existing_cover.clone());
        Self {
            title: &update.title,
            category_id: &update.category_id,
            content: &update.content,
            cover,
            images: urls.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_without_uploads() {
        let story = NewStory {
            title: "Dragon".into(),
            category_id: "2".into(),
            content: "...".into(),
            cover: Vec::new(),
        };
        let payload = StoryPayload::for_create(&story, Vec::new());
        assert_eq!(payload.cover.as_deref(), Some(""));
        assert!(payload.images.is_empty());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["cover"], "");
        assert_eq!(json["category_id"], "2");
    }

    #[test]
    fn test_create_splits_cover_from_images() {
        let story = NewStory::default();
        let payload = StoryPayload::for_create(&story, urls(&["a.png", "b.png", "c.png"]));
        assert_eq!(payload.cover.as_deref(), Some("a.png"));
        assert_eq!(payload.images, urls(&["b.png", "c.png"]));
    }

    #[test]
    fn test_create_drops_duplicates_of_cover() {
        let story = NewStory::default();
        let payload = StoryPayload::for_create(&story, urls(&["a.png", "b.png", "a.png"]));
        assert_eq!(payload.images, urls(&["b.png"]));
    }

    #[test]
    fn test_update_keeps_existing_cover() {
        let update = StoryUpdate {
            existing_cover: Some("old.png".into()),
            ..Default::default()
        };
        let payload = StoryPayload::for_update(&update, Vec::new());
        assert_eq!(payload.cover.as_deref(), Some("old.png"));
        assert!(payload.images.is_empty());

        let payload = StoryPayload::for_update(&update, urls(&["new.png", "x.png"]));
        assert_eq!(payload.cover.as_deref(), Some("new.png"));
        assert_eq!(payload.images, urls(&["x.png"]));
    }

    #[test]
    fn test_update_without_any_cover_omits_field() {
        let update = StoryUpdate::default();
        let json = serde_json::to_value(StoryPayload::for_update(&update, Vec::new())).unwrap();
        assert!(json.get("cover").is_none());
    }

    #[test]
    fn test_upload_content_type() {
        assert_eq!(Upload::new("a.JPG", vec![]).content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(Upload::new("notes", vec![]).content_type, None);
        assert_eq!(Upload::new("scan.bmp", vec![]).content_type.as_deref(), Some("image/bmp"));
        assert_eq!(Upload::new("photo.tiff", vec![]).content_type.as_deref(), Some("image/tiff"));
        assert_eq!(Upload::new("logo.svg", vec![]).content_type.as_deref(), Some("image/svg+xml"));
    }
}
