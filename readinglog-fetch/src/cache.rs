//! Conditional-request caching around any [`PageFetcher`].
//!
//! For each request the cache key is the path plus query string. A known
//! key is answered from the store without touching the network unless
//! `refresh` is set; with `refresh`, the stored validator goes out as
//! `If-None-Match` and a `304` is answered from the store. Fresh responses
//! overwrite the stored entry.
//!
//! The lookup, the network call, and the write for one key run under a
//! per-key lock, so concurrent fetches of the same page never interleave.

use async_trait::async_trait;
use readinglog_store::{CacheEntry, CacheStore};
use reqwest::header::IF_NONE_MATCH;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::fetcher::{Dispatch, Exchange, PageFetcher, PreSendHook};
use crate::request::{OutgoingRequest, PageRequest, RawResponse};

// ============================================================================
// Settings
// ============================================================================

/// What to do when the store cannot be read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreErrorPolicy {
    /// Abort the fetch with [`FetchError::CacheUnavailable`].
    #[default]
    Fail,
    /// Log a warning and fetch without the cache.
    Bypass,
}

/// Caching behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheSettings {
    /// Revalidate known entries instead of serving them directly.
    pub refresh: bool,
    /// Store failure handling.
    pub on_store_error: StoreErrorPolicy,
}

// ============================================================================
// Key Locks
// ============================================================================

/// One async mutex per cache key.
#[derive(Debug, Default)]
struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

// ============================================================================
// Caching Fetcher
// ============================================================================

/// A [`PageFetcher`] that consults a [`CacheStore`] before every request.
#[derive(Debug)]
pub struct CachingFetcher<F, S> {
    inner: F,
    store: Arc<S>,
    settings: CacheSettings,
    locks: KeyLocks,
}

impl<F, S> CachingFetcher<F, S>
where
    F: PageFetcher,
    S: CacheStore,
{
    /// Wraps `inner` with `store`, serving cached pages without revalidation.
    pub fn new(inner: F, store: Arc<S>) -> Self {
        Self::with_settings(inner, store, CacheSettings::default())
    }

    /// Wraps `inner` with `store` and explicit settings.
    pub fn with_settings(inner: F, store: Arc<S>, settings: CacheSettings) -> Self {
        Self {
            inner,
            store,
            settings,
            locks: KeyLocks::default(),
        }
    }

    /// The wrapped fetcher.
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current settings.
    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    async fn remember(&self, key: String, response: &RawResponse) -> Result<(), FetchError> {
        let entry = CacheEntry::new(
            key,
            response.etag().map(str::to_string),
            response.status,
            response.headers.clone(),
            response.body.clone(),
        );
        match self.store.put(entry).await {
            Ok(()) => Ok(()),
            Err(e) if self.settings.on_store_error == StoreErrorPolicy::Bypass => {
                warn!(
                    error = %e,
                    transient = e.is_transient(),
                    "Could not store response, continuing uncached"
                );
                Ok(())
            }
            Err(e) => Err(FetchError::CacheUnavailable(e)),
        }
    }
}

#[async_trait]
impl<F, S> PageFetcher for CachingFetcher<F, S>
where
    F: PageFetcher,
    S: CacheStore,
{
    async fn fetch_page_with(
        &self,
        request: &PageRequest,
        hook: &mut dyn PreSendHook,
    ) -> Result<Exchange, FetchError> {
        let mut lookup = CacheLookup {
            store: self.store.as_ref(),
            locks: &self.locks,
            refresh: self.settings.refresh,
            outer: &mut *hook,
            found: None,
        };
        let result = self.inner.fetch_page_with(request, &mut lookup).await;
        let found = lookup.found.take();
        drop(lookup);

        let exchange = match result {
            Err(FetchError::CacheUnavailable(e))
                if self.settings.on_store_error == StoreErrorPolicy::Bypass =>
            {
                warn!(
                    error = %e,
                    transient = e.is_transient(),
                    "Cache unavailable, fetching uncached"
                );
                return self.inner.fetch_page_with(request, hook).await;
            }
            other => other?,
        };

        // The inner fetcher never consulted the hook; nothing to reconcile.
        let Some(found) = found else {
            return Ok(exchange);
        };

        match exchange {
            Exchange::Skipped(response) => Ok(Exchange::Skipped(response)),
            Exchange::Performed(response) if response.is_not_modified() => match found.entry {
                Some(entry) => {
                    info!(key = %found.key, "Not modified, using cached page");
                    Ok(Exchange::Performed(entry.into()))
                }
                None => Err(FetchError::InvalidResponse(
                    "304 Not Modified for a page that is not cached".to_string(),
                )),
            },
            Exchange::Performed(response) => {
                self.remember(found.key, &response).await?;
                Ok(Exchange::Performed(response))
            }
        }
    }
}

// ============================================================================
// Hook
// ============================================================================

/// Result of the store lookup, held until the exchange is reconciled.
struct Found {
    key: String,
    entry: Option<CacheEntry>,
    _guard: OwnedMutexGuard<()>,
}

/// Hook installed on the inner fetcher.
struct CacheLookup<'a, S> {
    store: &'a S,
    locks: &'a KeyLocks,
    refresh: bool,
    outer: &'a mut dyn PreSendHook,
    found: Option<Found>,
}

#[async_trait]
impl<'a, S: CacheStore> PreSendHook for CacheLookup<'a, S> {
    async fn before_send(&mut self, request: &mut OutgoingRequest) -> Result<Dispatch, FetchError> {
        let key = request.cache_key();
        let guard = self.locks.acquire(&key).await;
        let entry = self.store.get(&key).await?;

        let cached = match &entry {
            Some(entry) => {
                if let Some(validator) = &entry.validator {
                    request.set_header(IF_NONE_MATCH, validator)?;
                }
                debug!(key = %key, "Found cached page");
                (!self.refresh).then(|| RawResponse::from(entry.clone()))
            }
            None => {
                debug!(key = %key, "No cache information");
                None
            }
        };

        self.found = Some(Found {
            key,
            entry,
            _guard: guard,
        });

        match cached {
            Some(response) => Ok(Dispatch::Skip(response)),
            None => self.outer.before_send(request).await,
        }
    }
}
