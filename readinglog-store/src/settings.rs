//! User settings and API credentials.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{
    default_cache_path, default_credentials_path, default_data_path, default_settings_path,
    load_json, load_yaml, save_json,
};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://www.goodreads.com";

// ============================================================================
// Settings
// ============================================================================

/// Persistent preferences. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP cache file.
    pub cache_path: PathBuf,
    /// Where the decoded review list is written.
    pub data_path: PathBuf,
    /// YAML file holding the API credentials.
    pub credentials_path: PathBuf,
    /// Shelf to list.
    pub shelf: String,
    /// Reviews per page.
    pub per_page: u32,
    /// Revalidate cached pages against the API on every run.
    pub refresh: bool,
    /// Fetch uncached instead of failing when the cache cannot be used.
    pub bypass_cache_errors: bool,
    /// API host.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts per page for transient network failures.
    pub max_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            data_path: default_data_path(),
            credentials_path: default_credentials_path(),
            shelf: "read".to_string(),
            per_page: 50,
            refresh: false,
            bypass_cache_errors: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_attempts: 3,
        }
    }
}

impl Settings {
    /// Loads settings from `path`; a missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        match load_json::<Settings>(path).await {
            Ok(settings) => {
                debug!(path = %path.display(), "Settings loaded");
                settings.validate()?;
                Ok(settings)
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Loads settings from the default location.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(&default_settings_path()).await
    }

    /// Saves settings to `path`.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        self.validate()?;
        save_json(path, self).await?;
        info!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.per_page == 0 {
            return Err(StoreError::Config("per_page must be at least 1".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(StoreError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.shelf.trim().is_empty() {
            return Err(StoreError::Config("shelf must not be empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// API credentials, read from a YAML file. Keys written as Ruby symbols
/// (`:id:`) are accepted too.
///
/// ```yaml
/// id: "12345678"
/// key: "developer-key"
/// secret: "developer-secret"
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// User id whose shelves are listed.
    #[serde(alias = ":id")]
    pub id: String,
    /// Developer key.
    #[serde(alias = ":key")]
    pub key: String,
    /// Developer secret. Not needed for read-only listing.
    #[serde(default, alias = ":secret")]
    pub secret: Option<String>,
}

impl Credentials {
    /// Loads credentials from a YAML file.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let creds: Credentials = load_yaml(path).await?;
        if creds.id.trim().is_empty() || creds.key.trim().is_empty() {
            return Err(StoreError::Config(format!(
                "{}: `id` and `key` must be set",
                path.display()
            )));
        }
        Ok(creds)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("key", &"<redacted>")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
