//! API client for the StoryTime REST API.
//!
//! Read operations degrade to empty results on failure; write operations
//! return an `ApiError`. Every failure is logged before it is handled.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error};

use super::{ApiError, ApiResult, StoryQuery};
use crate::config::Config;
use crate::models::{
    de, extract_list, Bookmark, Category, Envelope, NewStory, Story, StoryPayload, StoryUpdate,
    Upload, UserProfile,
};

/// Multipart field name the upload endpoint expects for each file
const UPLOAD_FIELD: &str = "files[]";

/// API client for StoryTime.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct StoryClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl StoryClient {
    /// Create a client for `base_url`. No timeout is applied unless one is given.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(config.api_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new StoryClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    /// Anonymous copy sharing the connection pool.
    pub fn without_token(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    fn require_token(&self, action: &str) -> ApiResult<&str> {
        self.bearer().ok_or_else(|| {
            error!(action, "Authorization token not found");
            ApiError::MissingToken
        })
    }

    fn rejected(action: &str, message: String) -> ApiError {
        error!(action, message = %message, "Request rejected by server");
        ApiError::Rejected(message)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> ApiResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn execute(request: RequestBuilder, action: &str) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            error!(action, error = %e, "Failed to send request");
            ApiError::from(e)
        })?;

        Self::check_response(response)
            .await
            .inspect_err(|e| error!(action, error = %e, "Request failed"))
    }

    async fn execute_json<T: DeserializeOwned>(
        request: RequestBuilder,
        action: &str,
    ) -> ApiResult<T> {
        let response = Self::execute(request, action).await?;
        response.json().await.map_err(|e| {
            error!(action, error = %e, "Failed to parse JSON response");
            ApiError::InvalidResponse(e.to_string())
        })
    }

    /// GET a list endpoint and pull the list out of `list_path`.
    /// Any failure is logged and yields an empty list.
    async fn fetch_list<T: DeserializeOwned>(
        request: RequestBuilder,
        list_path: &[&str],
        action: &str,
    ) -> Vec<T> {
        let body: Value = match Self::execute_json(request, action).await {
            Ok(body) => body,
            Err(_) => return Vec::new(),
        };

        match extract_list(body, list_path) {
            Ok(list) => list,
            Err(e) => {
                error!(action, error = %e, "Unexpected list shape in response");
                Vec::new()
            }
        }
    }

    // ===== Read paths =====

    pub(crate) fn stories_request(&self, query: &StoryQuery) -> RequestBuilder {
        self.client
            .get(self.url("/api/story"))
            .query(&query.pairs())
    }

    /// Fetch stories matching the given filters
    pub async fn fetch_stories(&self, query: &StoryQuery) -> Vec<Story> {
        Self::fetch_list(self.stories_request(query), &["data"], "fetch stories").await
    }

    pub async fn fetch_popular_stories(&self) -> Vec<Story> {
        let request = self.client.get(self.url("/api/stories/popular"));
        Self::fetch_list(request, &["data", "data"], "fetch popular stories").await
    }

    pub async fn fetch_newest_stories(&self) -> Vec<Story> {
        let request = self.client.get(self.url("/api/stories/newest"));
        Self::fetch_list(request, &["data"], "fetch newest stories").await
    }

    pub async fn fetch_categories(&self) -> Vec<Category> {
        let request = self.client.get(self.url("/api/category"));
        Self::fetch_list(request, &["data"], "fetch categories").await
    }

    /// Stories filed under one category (nested as `category.stories`)
    pub async fn fetch_category_stories(&self, category_id: &str) -> Vec<Story> {
        let request = self
            .client
            .get(self.url(&format!("/api/category/{}", category_id)));
        Self::fetch_list(request, &["data", "stories", "data"], "fetch category stories").await
    }

    /// Stories written by the token's user
    pub async fn fetch_user_stories(&self) -> Vec<Story> {
        let Some(token) = self.bearer() else {
            debug!("No token, skipping user stories");
            return Vec::new();
        };
        let request = self
            .client
            .get(self.url("/api/story-user"))
            .bearer_auth(token);
        Self::fetch_list(request, &["data"], "fetch user stories").await
    }

    /// Bookmarks of the token's user
    pub async fn fetch_bookmarks(&self) -> Vec<Bookmark> {
        let Some(token) = self.bearer() else {
            debug!("No token, skipping bookmarks");
            return Vec::new();
        };
        let request = self
            .client
            .get(self.url("/api/bookmark-user"))
            .bearer_auth(token);
        Self::fetch_list(request, &["data", "data"], "fetch bookmarks").await
    }

    /// Whether `story_id` is among the user's bookmarks.
    ///
    /// Scans the whole bookmark list; there is no per-story endpoint.
    pub async fn check_bookmark_status(&self, story_id: &str) -> bool {
        self.fetch_bookmarks()
            .await
            .iter()
            .any(|bookmark| bookmark.story_id() == Some(story_id))
    }

    // ===== Write paths =====

    /// Upload files and return their URLs in upload order.
    ///
    /// `Ok(None)` means the server answered with a body status other than 200.
    /// An empty file list completes without a request.
    pub async fn upload_images(&self, files: &[Upload]) -> ApiResult<Option<Vec<String>>> {
        const ACTION: &str = "upload images";
        let token = self.require_token(ACTION)?;
        if files.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let mut form = Form::new();
        for file in files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            if let Some(ref content_type) = file.content_type {
                part = part.mime_str(content_type)?;
            }
            form = form.part(UPLOAD_FIELD, part);
        }

        let request = self
            .client
            .post(self.url("/api/upload"))
            .bearer_auth(token)
            .multipart(form);
        let envelope: Envelope<Vec<Value>> = Self::execute_json(request, ACTION).await?;

        if !envelope.is_status(200) {
            debug!(status = ?envelope.status, "Upload not accepted");
            return Ok(None);
        }
        let urls = de::urls_from_values(envelope.data.unwrap_or_default());
        debug!(count = urls.len(), "Uploaded images");
        Ok(Some(urls))
    }

    /// Cover upload for a new story; a refused upload means no images.
    async fn upload_covers(&self, cover: &[Upload]) -> ApiResult<Vec<String>> {
        if cover.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.upload_images(cover).await?.unwrap_or_default())
    }

    /// Create a story, uploading its cover files first.
    /// Returns the full response body on body status 201.
    pub async fn create_story(&self, story: &NewStory) -> ApiResult<Envelope<Story>> {
        const ACTION: &str = "create story";
        let token = self.require_token(ACTION)?;

        let urls = self.upload_covers(&story.cover).await?;
        let payload = StoryPayload::for_create(story, urls);
        debug!(title = payload.title, images = payload.images.len(), "Posting story");

        let request = self
            .client
            .post(self.url("/api/story"))
            .bearer_auth(token)
            .json(&payload);
        let envelope: Envelope<Story> = Self::execute_json(request, ACTION).await?;

        if envelope.is_status(201) {
            Ok(envelope)
        } else {
            Err(Self::rejected(ACTION, envelope.message_or("Failed to create story")))
        }
    }

    /// Fetch one story through the authenticated endpoint
    pub async fn fetch_story(&self, story_id: &str) -> ApiResult<Story> {
        const ACTION: &str = "fetch story";
        let token = self.require_token(ACTION)?;

        let request = self
            .client
            .get(self.url(&format!("/api/story/{}", story_id)))
            .bearer_auth(token);
        let envelope: Envelope<Story> = Self::execute_json(request, ACTION).await?;

        let accepted = envelope.is_status(200);
        match envelope.data {
            Some(story) if accepted => Ok(story),
            _ => Err(Self::rejected(ACTION, "Failed to fetch story".to_string())),
        }
    }

    /// Update a story, uploading replacement cover files first.
    /// Returns the full response body on body status 200.
    pub async fn update_story(
        &self,
        story_id: &str,
        update: &StoryUpdate,
    ) -> ApiResult<Envelope<Story>> {
        const ACTION: &str = "update story";
        let token = self.require_token(ACTION)?;

        let urls = if update.cover.is_empty() {
            Vec::new()
        } else {
            // A refused replacement cover must not fall back to the old one
            self.upload_images(&update.cover)
                .await?
                .ok_or_else(|| Self::rejected(ACTION, "Failed to update story".to_string()))?
        };
        let payload = StoryPayload::for_update(update, urls);

        let request = self
            .client
            .put(self.url(&format!("/api/story/{}", story_id)))
            .bearer_auth(token)
            .json(&payload);
        let envelope: Envelope<Story> = Self::execute_json(request, ACTION).await?;

        if envelope.is_status(200) {
            Ok(envelope)
        } else {
            Err(Self::rejected(ACTION, envelope.message_or("Failed to update story")))
        }
    }

    /// Delete a story. An HTTP 404 is reported as `ApiError::StoryNotFound`.
    pub async fn delete_story(&self, story_id: &str) -> ApiResult<bool> {
        const ACTION: &str = "delete story";
        let token = self.require_token(ACTION)?;

        let request = self
            .client
            .delete(self.url(&format!("/api/stories/{}", story_id)))
            .bearer_auth(token);
        let envelope: Envelope<Value> = match Self::execute_json(request, ACTION).await {
            Err(ApiError::NotFound(_)) => return Err(ApiError::StoryNotFound),
            other => other?,
        };

        if envelope.is_status(200) {
            Ok(true)
        } else {
            Err(Self::rejected(ACTION, envelope.message_or("Failed to delete story")))
        }
    }

    /// Bookmark or un-bookmark a story. True when the server reports status 200.
    pub async fn toggle_bookmark(&self, story_id: &str) -> ApiResult<bool> {
        const ACTION: &str = "toggle bookmark";
        let token = self.require_token(ACTION)?;

        let request = self
            .client
            .post(self.url("/api/bookmark"))
            .bearer_auth(token)
            .json(&json!({ "story_id": story_id }));
        let envelope: Envelope<Value> = Self::execute_json(request, ACTION).await?;
        Ok(envelope.is_status(200))
    }

    /// Public story detail, no token required
    pub async fn fetch_story_detail(&self, story_id: &str) -> ApiResult<Story> {
        const ACTION: &str = "fetch story detail";
        let request = self
            .client
            .get(self.url(&format!("/api/story/detail/{}", story_id)));
        let envelope: Envelope<Story> = Self::execute_json(request, ACTION).await?;

        let accepted = envelope.is_status(200);
        match envelope.data {
            Some(story) if accepted => Ok(story),
            _ => Err(Self::rejected(ACTION, "Failed to fetch story details".to_string())),
        }
    }

    // ===== Profile =====

    /// The token's user profile; the whole response body is the profile.
    pub async fn fetch_profile(&self) -> ApiResult<UserProfile> {
        const ACTION: &str = "fetch profile";
        let token = self.require_token(ACTION)?;

        let request = self
            .client
            .get(self.url("/api/users/profile"))
            .bearer_auth(token);
        let body: Value = Self::execute_json(request, ACTION).await?;
        Self::profile_from(body, ACTION)
    }

    /// Send profile changes; returns the profile as the server now has it.
    pub async fn put_profile(&self, changes: &Value) -> ApiResult<UserProfile> {
        const ACTION: &str = "update profile";
        let token = self.require_token(ACTION)?;

        let request = self
            .client
            .put(self.url("/api/users/profile"))
            .bearer_auth(token)
            .json(changes);
        let body: Value = Self::execute_json(request, ACTION).await?;
        Self::profile_from(body, ACTION)
    }

    fn profile_from(body: Value, action: &str) -> ApiResult<UserProfile> {
        UserProfile::from_value(body).ok_or_else(|| {
            error!(action, "Profile response is not a JSON object");
            ApiError::InvalidResponse("profile is not a JSON object".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StoryClient {
        StoryClient::new("http://stories.test/", None).unwrap()
    }

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(client().base_url(), "http://stories.test");
        assert_eq!(client().url("/api/story"), "http://stories.test/api/story");
    }

    #[test]
    fn test_stories_request_without_filters_has_no_query() {
        let request = client().stories_request(&StoryQuery::new()).build().unwrap();
        assert_eq!(request.url().as_str(), "http://stories.test/api/story");
        assert_eq!(request.url().query(), None);
    }

    #[test]
    fn test_stories_request_encodes_filters() {
        let query = StoryQuery::new().sort("newest").title("dragon");
        let request = client().stories_request(&query).build().unwrap();
        assert_eq!(request.url().path(), "/api/story");

        let mut pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("sort".to_string(), "newest".to_string()),
                ("title".to_string(), "dragon".to_string()),
            ]
        );
    }

    #[test]
    fn test_stories_request_escapes_values() {
        let query = StoryQuery::new().title("red & gold");
        let request = client().stories_request(&query).build().unwrap();
        assert_eq!(request.url().query(), Some("title=red+%26+gold"));
    }

    #[test]
    fn test_token_handling() {
        let anonymous = client();
        assert!(anonymous.token().is_none());
        assert!(anonymous.require_token("test").unwrap_err().is_missing_token());

        let authed = anonymous.with_token("abc".to_string());
        assert_eq!(authed.require_token("test").unwrap(), "abc");
        assert!(authed.without_token().token().is_none());

        let empty = anonymous.with_token(String::new());
        assert!(empty.require_token("test").is_err());
    }

    #[tokio::test]
    async fn test_writes_without_token_fail_before_sending() {
        // Nothing listens on this port, so reaching the network would be a NetworkError
        let client = StoryClient::new("http://127.0.0.1:9", None).unwrap();
        assert!(matches!(client.toggle_bookmark("42").await, Err(ApiError::MissingToken)));
        assert!(matches!(client.delete_story("42").await, Err(ApiError::MissingToken)));
        assert!(matches!(client.fetch_story("42").await, Err(ApiError::MissingToken)));
        assert!(matches!(
            client.upload_images(&[]).await,
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            client.create_story(&NewStory::default()).await,
            Err(ApiError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn test_upload_nothing_returns_empty_list() {
        let client = StoryClient::new("http://127.0.0.1:9", None)
            .unwrap()
            .with_token("abc".to_string());
        let urls = client.upload_images(&[]).await.unwrap();
        assert_eq!(urls, Some(Vec::new()));
    }
}
