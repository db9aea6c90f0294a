//! Application configuration management.
//!
//! Holds the story API base URL, an optional request timeout and the cookie
//! storage backend. Configuration is stored at
//! `~/.config/storytime/config.json`; environment variables override it.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{CookieJar, FileCookieJar, KeyringCookieJar};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "storytime";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Story API host used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://157.245.193.94";

/// Overrides `api_url`
pub const API_URL_ENV: &str = "STORYTIME_API_URL";

/// Overrides `cookie_store` (`file` or `keyring`)
pub const COOKIE_STORE_ENV: &str = "STORYTIME_COOKIE_STORE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieStore {
    #[default]
    File,
    Keyring,
}

impl FromStr for CookieStore {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(CookieStore::File),
            "keyring" => Ok(CookieStore::Keyring),
            other => Err(anyhow!("Unknown cookie store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub request_timeout_secs: Option<u64>,
    pub cookie_store: CookieStore,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: None,
            cookie_store: CookieStore::default(),
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from `lookup` (the process environment in `load`).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            debug!(api_url = %url, "Using API URL from environment");
            self.api_url = url.trim().to_string();
        }
        if let Some(store) = lookup(COOKIE_STORE_ENV) {
            match store.parse() {
                Ok(store) => self.cookie_store = store,
                Err(e) => warn!(error = %e, "Ignoring {}", COOKIE_STORE_ENV),
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Open the cookie jar selected by `cookie_store`.
    pub fn open_jar(&self) -> Result<Arc<dyn CookieJar>> {
        let jar: Arc<dyn CookieJar> = match self.cookie_store {
            CookieStore::File => Arc::new(FileCookieJar::in_dir(&self.cache_dir()?)),
            CookieStore::Keyring => Arc::new(KeyringCookieJar::new()),
        };
        Ok(jar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.cookie_store, CookieStore::File);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (API_URL_ENV, " http://localhost:8000 "),
            (COOKIE_STORE_ENV, "Keyring"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.cookie_store, CookieStore::Keyring);
    }

    #[test]
    fn test_bad_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            COOKIE_STORE_ENV => Some("floppy".to_string()),
            API_URL_ENV => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"request_timeout_secs": 15}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            api_url: "http://stories.test".to_string(),
            request_timeout_secs: Some(30),
            cookie_store: CookieStore::Keyring,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        assert_eq!(Config::load_from(&dir.path().join("missing.json")).unwrap(), Config::default());
    }
}
