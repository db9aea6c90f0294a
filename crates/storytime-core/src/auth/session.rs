use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::jar::CookieJar;
use crate::api::{ApiError, ApiResult, StoryClient};
use crate::models::UserProfile;

/// Cookie holding the raw bearer token
pub const TOKEN_COOKIE: &str = "token";

/// Cookie holding the JSON-serialized user profile
pub const USER_COOKIE: &str = "user";

/// Both session cookies expire one day after they are written.
const SESSION_TTL_DAYS: i64 = 1;

fn session_ttl() -> Duration {
    Duration::days(SESSION_TTL_DAYS)
}

/// Authentication token plus cached user profile, persisted to a cookie jar.
///
/// A session is an ordinary value: build one per user context with
/// [`Session::restore`]. Nothing guards concurrent writers sharing a jar;
/// the last write wins.
pub struct Session {
    jar: Arc<dyn CookieJar>,
    token: Option<String>,
    user: Option<UserProfile>,
}

impl Session {
    /// Restore token and user from the jar. Unreadable or malformed entries
    /// are logged and treated as absent.
    pub fn restore(jar: Arc<dyn CookieJar>) -> Self {
        let token = read_cookie(jar.as_ref(), TOKEN_COOKIE).filter(|t| !t.is_empty());
        let user = read_cookie(jar.as_ref(), USER_COOKIE).and_then(|raw| parse_user(&raw));
        debug!(
            has_token = token.is_some(),
            has_user = user.is_some(),
            "Session restored"
        );
        Self { jar, token, user }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Store a token, or clear it when `None` or empty.
    pub fn set_token(&mut self, token: Option<&str>) -> Result<()> {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => {
                self.jar
                    .set(TOKEN_COOKIE, token, session_ttl())
                    .context("Failed to persist token")?;
                self.token = Some(token.to_string());
            }
            None => {
                self.jar
                    .remove(TOKEN_COOKIE)
                    .context("Failed to remove token")?;
                self.token = None;
            }
        }
        Ok(())
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Store a detached copy of `user`, or clear it when `None`.
    ///
    /// The copy is produced by a JSON round trip, so what is kept in memory
    /// is exactly what a later restore will read back.
    pub fn set_user(&mut self, user: Option<&UserProfile>) -> Result<()> {
        match user {
            Some(user) => {
                let raw = serde_json::to_string(user).context("Failed to serialize user profile")?;
                let copy: UserProfile =
                    serde_json::from_str(&raw).context("Failed to copy user profile")?;
                self.jar
                    .set(USER_COOKIE, &raw, session_ttl())
                    .context("Failed to persist user profile")?;
                self.user = Some(copy);
            }
            None => {
                self.jar
                    .remove(USER_COOKIE)
                    .context("Failed to remove user profile")?;
                self.user = None;
            }
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// A client carrying this session's token (or none), sharing `client`'s
    /// connection pool.
    pub fn authorize(&self, client: &StoryClient) -> StoryClient {
        match &self.token {
            Some(token) => client.with_token(token.clone()),
            None => client.without_token(),
        }
    }

    /// Refresh the cached profile from the server.
    ///
    /// Returns `None` without touching the network when there is no token.
    /// Every failure is logged and reported as `None`.
    pub async fn fetch_current_user(&mut self, client: &StoryClient) -> Option<UserProfile> {
        let token = self.token.clone()?;

        let profile = match client.with_token(token).fetch_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                error!(error = %e, "Error fetching user profile");
                return None;
            }
        };

        if let Err(e) = self.set_user(Some(&profile)) {
            error!(error = %e, "Error storing fetched user profile");
            return None;
        }
        Some(profile)
    }

    /// Send a (partial) profile update and cache the server's result.
    pub async fn update_profile(
        &mut self,
        client: &StoryClient,
        changes: &Value,
    ) -> ApiResult<UserProfile> {
        let Some(token) = self.token.clone() else {
            error!("Authorization token not found, cannot update profile");
            return Err(ApiError::MissingToken);
        };

        let profile = client
            .with_token(token)
            .put_profile(changes)
            .await
            .inspect_err(|e| error!(error = %e, "Error updating profile"))?;

        self.set_user(Some(&profile)).map_err(|e| {
            error!(error = %e, "Error storing updated profile");
            ApiError::Storage(format!("{:#}", e))
        })?;
        Ok(profile)
    }

    /// Forget token and user. Memory is always cleared; both cookies are
    /// removed even if the first removal fails, and the first failure is
    /// returned.
    pub fn logout(&mut self) -> Result<()> {
        self.token = None;
        self.user = None;

        let token_removed = self.jar.remove(TOKEN_COOKIE);
        let user_removed = self.jar.remove(USER_COOKIE);
        for (name, result) in [(TOKEN_COOKIE, &token_removed), (USER_COOKIE, &user_removed)] {
            if let Err(e) = result {
                error!(cookie = name, error = %e, "Error during logout");
            }
        }
        token_removed.and(user_removed)
    }
}

fn read_cookie(jar: &dyn CookieJar, name: &str) -> Option<String> {
    match jar.get(name) {
        Ok(value) => value,
        Err(e) => {
            warn!(cookie = name, error = %e, "Failed to read session cookie");
            None
        }
    }
}

fn parse_user(raw: &str) -> Option<UserProfile> {
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(user) => Some(user),
        Err(e) => {
            error!(error = %e, "Error parsing stored user profile");
            None
        }
    }
}
