use anyhow::{Context, Result};
use chrono::Duration;
use keyring::Entry;
use tracing::{debug, warn};

use super::jar::{CookieJar, StoredCookie};

const SERVICE_NAME: &str = "storytime";

/// Cookie jar backed by the OS keychain, one entry per cookie.
pub struct KeyringCookieJar {
    service: String,
}

impl KeyringCookieJar {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, name: &str) -> Result<Entry> {
        Entry::new(&self.service, name).context("Failed to create keyring entry")
    }
}

impl Default for KeyringCookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar for KeyringCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let entry = self.entry(name)?;
        let raw = match entry.get_password() {
            Ok(raw) => raw,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => {
                return Err(e).context("Failed to retrieve cookie from keychain");
            }
        };

        let cookie: StoredCookie = match serde_json::from_str(&raw) {
            Ok(cookie) => cookie,
            Err(e) => {
                warn!(cookie = name, error = %e, "Ignoring unreadable keychain cookie");
                return Ok(None);
            }
        };

        if cookie.is_expired() {
            debug!(cookie = name, "Dropping expired keychain cookie");
            self.remove(name)?;
            return Ok(None);
        }
        Ok(Some(cookie.value))
    }

    fn set(&self, name: &str, value: &str, ttl: Duration) -> Result<()> {
        let raw = serde_json::to_string(&StoredCookie::new(value, ttl))?;
        self.entry(name)?
            .set_password(&raw)
            .context("Failed to store cookie in keychain")
    }

    fn remove(&self, name: &str) -> Result<()> {
        match self.entry(name)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete cookie from keychain"),
        }
    }
}
