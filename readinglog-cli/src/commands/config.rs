//! Config command - show or initialize configuration.

use anyhow::Result;
use clap::Args;
use readinglog_store::Settings;
use std::path::Path;
use tracing::info;

use crate::Cli;
use crate::commands::{load_settings, settings_path};

/// Arguments for the config command.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Show configuration paths instead of values.
    #[arg(long)]
    pub path: bool,

    /// Write a settings file with the defaults if none exists.
    #[arg(long)]
    pub init: bool,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    let path = settings_path(cli);

    if args.init {
        init_settings(&path).await?;
    }

    let settings = load_settings(cli).await?;
    if args.path {
        show_paths(&path, &settings);
    } else if !args.init {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    }

    Ok(())
}

async fn init_settings(path: &Path) -> Result<()> {
    if tokio::fs::try_exists(path).await? {
        println!("Settings already exist at {}", path.display());
        return Ok(());
    }

    Settings::default().save(path).await?;
    info!(path = %path.display(), "Settings initialized");
    println!("Wrote default settings to {}", path.display());
    Ok(())
}

fn show_paths(path: &Path, settings: &Settings) {
    println!("Settings:    {}", path.display());
    println!("Credentials: {}", settings.credentials_path.display());
    println!("HTTP cache:  {}", settings.cache_path.display());
    println!("Reviews:     {}", settings.data_path.display());
}
