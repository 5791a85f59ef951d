//! Fetch command - page through a shelf and save every review.

use anyhow::{Context, Result};
use clap::Args;
use readinglog_core::Review;
use readinglog_fetch::{
    ApiClient, CacheSettings, CachingFetcher, DEFAULT_START, Endpoint, FetchError, ReviewList,
    RetryPolicy, StoreErrorPolicy,
};
use readinglog_store::{
    CacheStore, Credentials, FileCacheStore, MemoryCacheStore, Settings, save_json,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Cli;
use crate::commands::load_settings;

/// Arguments for the fetch command.
#[derive(Args, Debug, Default)]
pub struct FetchArgs {
    /// HTTP cache file.
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Where to write the reviews as JSON.
    #[arg(long, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Credentials file (YAML with `id` and `key`).
    #[arg(long, value_name = "PATH")]
    pub auth: Option<PathBuf>,

    /// Shelf to list.
    #[arg(long, short)]
    pub shelf: Option<String>,

    /// Reviews per page.
    #[arg(long)]
    pub per_page: Option<u32>,

    /// 1-based offset of the first review.
    #[arg(long)]
    pub start: Option<u32>,

    /// Revalidate cached pages instead of trusting them.
    #[arg(long)]
    pub refresh: bool,
}

impl FetchArgs {
    /// Overrides settings with the flags that were given.
    fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.cache {
            settings.cache_path.clone_from(path);
        }
        if let Some(path) = &self.data {
            settings.data_path.clone_from(path);
        }
        if let Some(path) = &self.auth {
            settings.credentials_path.clone_from(path);
        }
        if let Some(shelf) = &self.shelf {
            settings.shelf.clone_from(shelf);
        }
        if let Some(per_page) = self.per_page {
            settings.per_page = per_page;
        }
        if self.refresh {
            settings.refresh = true;
        }
    }
}

/// Runs the fetch command.
pub async fn run(args: &FetchArgs, cli: &Cli) -> Result<()> {
    let mut settings = load_settings(cli).await?;
    args.apply(&mut settings);
    settings.validate()?;

    let credentials = Credentials::load(&settings.credentials_path)
        .await
        .with_context(|| {
            format!(
                "reading credentials from {}",
                settings.credentials_path.display()
            )
        })?;

    let endpoint = Endpoint::new(&settings.base_url, &credentials.id, credentials.key.clone())?;
    let client = ApiClient::with_timeout(endpoint, Duration::from_secs(settings.timeout_secs))?
        .with_retry_policy(RetryPolicy::new(settings.max_attempts));
    let cache = open_cache(&settings).await?;

    let token = CancellationToken::new();
    let interrupt = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping before the next page");
                token.cancel();
            }
        })
    };

    info!(shelf = %settings.shelf, per_page = settings.per_page, "Fetching shelf");
    let start = args.start.unwrap_or(DEFAULT_START);
    let result = match cache {
        Some(store) => list_shelf(client, Arc::new(store), &settings, start, token).await,
        None => {
            let store = Arc::new(MemoryCacheStore::new());
            list_shelf(client, store, &settings, start, token).await
        }
    };
    interrupt.abort();
    let reviews = result?;

    save_json(&settings.data_path, &reviews)
        .await
        .with_context(|| format!("writing {}", settings.data_path.display()))?;

    if !cli.quiet {
        println!("{}", summary(&settings.shelf, &reviews));
        println!("Saved to {}", settings.data_path.display());
    }

    Ok(())
}

/// Opens the HTTP cache file.
///
/// With `bypass_cache_errors`, an unreadable file yields `None` and the run
/// continues with an in-memory cache.
async fn open_cache(settings: &Settings) -> Result<Option<FileCacheStore>> {
    match FileCacheStore::open(&settings.cache_path).await {
        Ok(store) => Ok(Some(store)),
        Err(e) if settings.bypass_cache_errors => {
            warn!(
                path = %settings.cache_path.display(),
                error = %e,
                transient = e.is_transient(),
                "Cache file unusable, continuing with an in-memory cache"
            );
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("opening cache {}", settings.cache_path.display())),
    }
}

/// Lists the configured shelf through `store`.
async fn list_shelf<S: CacheStore>(
    client: ApiClient,
    store: Arc<S>,
    settings: &Settings,
    start: u32,
    token: CancellationToken,
) -> Result<Vec<Review>, FetchError> {
    let fetcher = CachingFetcher::with_settings(client, store, cache_settings(settings));
    let list = ReviewList::new(fetcher).with_cancellation(token);
    let reviews = list.list(&settings.shelf, start, settings.per_page).await?;

    if let Ok(entries) = list.fetcher().store().len().await {
        debug!(
            entries,
            endpoint = ?list.fetcher().inner().endpoint(),
            "Cache after listing"
        );
    }
    Ok(reviews)
}

fn cache_settings(settings: &Settings) -> CacheSettings {
    CacheSettings {
        refresh: settings.refresh,
        on_store_error: if settings.bypass_cache_errors {
            StoreErrorPolicy::Bypass
        } else {
            StoreErrorPolicy::Fail
        },
    }
}

/// One-line description of a fetched shelf.
fn summary(shelf: &str, reviews: &[Review]) -> String {
    let rated = reviews.iter().filter(|r| r.rating() > 0.0).count();
    let latest = reviews.iter().max_by_key(|r| r.read_at());

    match latest {
        Some(review) => format!(
            "{shelf}: {} reviews ({rated} rated), last read \"{}\" on {}",
            reviews.len(),
            review.book().title(),
            review.read_at().format("%Y-%m-%d")
        ),
        None => format!("{shelf}: no reviews"),
    }
}
