//! Cookie-style persistent storage for session state.
//!
//! Every entry carries an absolute expiry. Expired entries read as absent and
//! are removed the next time they are looked up.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Cookie file name in cache directory
const COOKIE_FILE: &str = "cookies.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredCookie {
    pub fn new(value: impl Into<String>, ttl: Duration) -> Self {
        Self {
            value: value.into(),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// `(expired, value)` for a stored entry.
fn lookup(cookies: &HashMap<String, StoredCookie>, name: &str) -> Option<(bool, String)> {
    cookies
        .get(name)
        .map(|cookie| (cookie.is_expired(), cookie.value.clone()))
}

/// Durable key-value storage with per-entry expiry.
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>>;
    fn set(&self, name: &str, value: &str, ttl: Duration) -> Result<()>;
    fn remove(&self, name: &str) -> Result<()>;
}

/// Cookies kept in one JSON document on disk.
pub struct FileCookieJar {
    path: PathBuf,
}

impl FileCookieJar {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Jar stored as `cookies.json` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(COOKIE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, StoredCookie>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cookie file: {}", self.path.display()))?;
        match serde_json::from_str(&contents) {
            Ok(cookies) => Ok(cookies),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable cookie file");
                Ok(HashMap::new())
            }
        }
    }

    fn save(&self, cookies: &HashMap<String, StoredCookie>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(cookies)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write cookie file: {}", self.path.display()))?;
        Ok(())
    }
}

impl CookieJar for FileCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let mut cookies = self.load()?;
        match lookup(&cookies, name) {
            Some((true, _)) => {
                debug!(cookie = name, "Dropping expired cookie");
                cookies.remove(name);
                self.save(&cookies)?;
                Ok(None)
            }
            Some((false, value)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    fn set(&self, name: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut cookies = self.load()?;
        cookies.insert(name.to_string(), StoredCookie::new(value, ttl));
        self.save(&cookies)
    }

    fn remove(&self, name: &str) -> Result<()> {
        let mut cookies = self.load()?;
        if cookies.remove(name).is_some() {
            self.save(&cookies)?;
        }
        Ok(())
    }
}

/// Process-local jar. Each instance is isolated, so sessions built on
/// separate memory jars never see each other's state.
#[derive(Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, StoredCookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry with an explicit expiry.
    pub fn insert(&self, name: &str, cookie: StoredCookie) -> Result<()> {
        self.lock()?.insert(name.to_string(), cookie);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().map(|c| c.contains_key(name)).unwrap_or(false)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredCookie>>> {
        self.cookies
            .lock()
            .map_err(|_| anyhow!("Cookie jar lock poisoned"))
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let mut cookies = self.lock()?;
        match lookup(&cookies, name) {
            Some((true, _)) => {
                cookies.remove(name);
                Ok(None)
            }
            Some((false, value)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    fn set(&self, name: &str, value: &str, ttl: Duration) -> Result<()> {
        self.insert(name, StoredCookie::new(value, ttl))
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.lock()?.remove(name);
        Ok(())
    }
}
