// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! readinglog CLI - mirror a Goodreads shelf to a local JSON file.
//!
//! # Examples
//!
//! ```bash
//! # Fetch the "read" shelf using saved settings
//! readinglog
//!
//! # Fetch another shelf, revalidating cached pages
//! readinglog fetch --shelf to-read --refresh
//!
//! # Smaller pages, explicit credentials file
//! readinglog gr --per-page 20 --auth ~/goodreads.yml
//!
//! # Show where everything lives
//! readinglog config --path
//!
//! # Write a default settings file
//! readinglog config --init
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use readinglog_fetch::FetchError;
use readinglog_store::StoreError;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, fetch};

// ============================================================================
// CLI Definition
// ============================================================================

/// readinglog CLI - Goodreads review list mirror.
#[derive(Parser)]
#[command(name = "readinglog")]
#[command(about = "Mirror a Goodreads shelf to local JSON")]
#[command(long_about = r#"
readinglog pages through a Goodreads shelf, decodes every review with its
book, authors and shelves, and writes the result as JSON.

Responses are cached on disk with their ETags, so repeated runs only hit
the network for pages that are new or, with --refresh, have changed.

Examples:
  readinglog                          # Fetch with saved settings
  readinglog fetch --shelf to-read    # Another shelf
  readinglog fetch --refresh          # Revalidate cached pages
  readinglog config --path            # Show file locations
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'fetch' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Settings file (defaults to the platform config directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a shelf and save its reviews (default if no command specified).
    #[command(visible_alias = "gr")]
    Fetch(fetch::FetchArgs),

    /// Show or initialize configuration.
    Config(config::ConfigArgs),
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Settings or credentials are missing or invalid.
    Config = 2,
    /// The API could not be reached or refused the request.
    Network = 3,
    /// A response could not be decoded.
    ParseError = 4,
    /// Interrupted by the user.
    Cancelled = 130,
}

impl ExitCode {
    /// Picks the exit code for an error.
    fn for_error(error: &anyhow::Error) -> Self {
        if let Some(e) = error.downcast_ref::<FetchError>() {
            return match e {
                FetchError::Cancelled => ExitCode::Cancelled,
                FetchError::Mapping(_) | FetchError::InvalidResponse(_) | FetchError::Stalled { .. } => {
                    ExitCode::ParseError
                }
                FetchError::InvalidRequest(_) => ExitCode::Config,
                e if e.is_network() => ExitCode::Network,
                _ => ExitCode::Error,
            };
        }
        match error.downcast_ref::<StoreError>() {
            Some(StoreError::Config(_) | StoreError::Yaml(_)) => ExitCode::Config,
            _ => ExitCode::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("readinglog=debug,info")
    } else {
        EnvFilter::new("readinglog=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Fetch(args)) => fetch::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        None => fetch::run(&fetch::FetchArgs::default(), &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}
