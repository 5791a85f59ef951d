//! File persistence helpers.
//!
//! Every file written here goes through a temp file and a rename, so a crash
//! mid-write leaves the previous contents in place.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Directory name used under the platform config and data roots.
const APP_DIR: &str = "readinglog";

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory (`~/.config/readinglog` on Linux).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|c| c.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default data directory (`~/.local/share/readinglog` on Linux).
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Returns the default settings file path.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

/// Returns the default HTTP cache file path.
pub fn default_cache_path() -> PathBuf {
    default_data_dir().join("http_cache.json")
}

/// Returns the default path of the decoded review list.
pub fn default_data_path() -> PathBuf {
    default_data_dir().join("reviews.json")
}

/// Returns the default credentials file path.
pub fn default_credentials_path() -> PathBuf {
    default_config_dir().join("goodreads.yml")
}

// ============================================================================
// Permissions
// ============================================================================

/// Restricts a file to its owner (0o600). The cache holds the API key inside
/// every stored request path.
#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Writes bytes atomically (temp file + rename) with owner-only permissions.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    tokio::fs::write(&temp_path, contents).await?;
    restrict_permissions(&temp_path).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), bytes = contents.len(), "File written");
    Ok(())
}

/// Saves data as pretty-printed JSON.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(data)?;
    write_atomic(path, &json).await
}

/// Loads data from a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");
    let content = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&content)?)
}

/// Loads data from a JSON file, returning the default if it is missing or unreadable.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            T::default()
        }
    }
}

/// Loads data from a YAML file.
pub async fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading YAML file");
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Ensures a directory exists.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if path.as_os_str().is_empty() || tokio::fs::try_exists(path).await? {
        return Ok(());
    }
    debug!(path = %path.display(), "Creating directory");
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}
