//! CLI command implementations.

pub mod config;
pub mod fetch;

use anyhow::{Context, Result};
use readinglog_store::{Settings, default_settings_path};
use std::path::PathBuf;

use crate::Cli;

/// Settings file selected by `--config`, or the default location.
pub fn settings_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(default_settings_path)
}

/// Loads settings from the selected file.
pub async fn load_settings(cli: &Cli) -> Result<Settings> {
    let path = settings_path(cli);
    Settings::load(&path)
        .await
        .with_context(|| format!("loading settings from {}", path.display()))
}
