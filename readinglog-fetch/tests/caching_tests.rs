//! Caching layer tests.

mod common;

use async_trait::async_trait;
use common::ScriptedApi;
use readinglog_fetch::{
    CacheSettings, CachingFetcher, Dispatch, Exchange, FetchError, OutgoingRequest, PageFetcher,
    PageRequest, PreSendHook, RawResponse, ReviewList, StoreErrorPolicy,
};
use readinglog_store::{CacheEntry, CacheStore, FileCacheStore, MemoryCacheStore, StoreError};
use std::collections::BTreeMap;
use std::sync::Arc;

fn refreshing() -> CacheSettings {
    CacheSettings {
        refresh: true,
        ..CacheSettings::default()
    }
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let api = ScriptedApi::new().with_shelf("read", 125);
    let store = Arc::new(MemoryCacheStore::new());
    let list = ReviewList::new(CachingFetcher::new(api.clone(), Arc::clone(&store)));

    let first = list.list("read", 1, 50).await.unwrap();
    assert_eq!(api.calls(), 3);
    assert_eq!(list.fetcher().inner().calls(), 3);
    assert_eq!(list.fetcher().store().len().await.unwrap(), 3);
    assert!(!list.fetcher().settings().refresh);

    let second = list.list("read", 1, 50).await.unwrap();
    assert_eq!(api.calls(), 3, "no network calls on the second run");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_refresh_revalidates_with_etag() {
    let api = ScriptedApi::new().with_shelf("read", 5);
    let store = Arc::new(MemoryCacheStore::new());
    let list = ReviewList::new(CachingFetcher::with_settings(
        api.clone(),
        Arc::clone(&store),
        refreshing(),
    ));

    let first = list.list("read", 1, 2).await.unwrap();
    assert_eq!(api.calls(), 3);
    assert!(api.conditional().is_empty());

    let second = list.list("read", 1, 2).await.unwrap();
    assert_eq!(api.calls(), 6);
    assert_eq!(
        api.conditional(),
        vec!["\"read-1-v0\"", "\"read-2-v0\"", "\"read-3-v0\""]
    );
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_changed_page_replaces_cached_entry() {
    let api = ScriptedApi::new().with_shelf("read", 2);
    let store = Arc::new(MemoryCacheStore::new());
    let fetcher = CachingFetcher::with_settings(api.clone(), Arc::clone(&store), refreshing());
    let request = PageRequest::new("read", 1, 50);

    fetcher.fetch_page(&request).await.unwrap();
    api.touch("read");
    let response = fetcher.fetch_page(&request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.etag(), Some("\"read-1-v1\""));
    let key = common::endpoint().request_for(&request).cache_key();
    let entry = store.get(&key).await.unwrap().unwrap();
    assert_eq!(entry.validator.as_deref(), Some("\"read-1-v1\""));
}

#[tokio::test]
async fn test_shelves_are_cached_separately() {
    let api = ScriptedApi::new().with_shelf("read", 3).with_shelf("to-read", 1);
    let store = Arc::new(MemoryCacheStore::new());
    let list = ReviewList::new(CachingFetcher::new(api.clone(), Arc::clone(&store)));

    let read = list.list("read", 1, 2).await.unwrap();
    let to_read = list.list("to-read", 1, 2).await.unwrap();

    assert_eq!(read.len(), 3);
    assert_eq!(to_read.len(), 1);
    assert_eq!(api.calls(), 3);
    assert_eq!(store.len().await.unwrap(), 3);
    assert!(store.keys().await.iter().any(|k| k.contains("shelf=to-read")));
}

#[tokio::test]
async fn test_cache_survives_restart() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("http_cache.json");
    let api = ScriptedApi::new().with_shelf("read", 4);

    let store = Arc::new(FileCacheStore::open(&path).await.unwrap());
    let first = ReviewList::new(CachingFetcher::new(api.clone(), store))
        .list("read", 1, 2)
        .await
        .unwrap();
    assert_eq!(api.calls(), 2);

    let reopened = Arc::new(FileCacheStore::open(&path).await.unwrap());
    let second = ReviewList::new(CachingFetcher::new(api.clone(), reopened))
        .list("read", 1, 2)
        .await
        .unwrap();
    assert_eq!(api.calls(), 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrent_fetches_of_one_page_hit_network_once() {
    let api = ScriptedApi::new().with_shelf("read", 3);
    let fetcher = CachingFetcher::new(api.clone(), Arc::new(MemoryCacheStore::new()));
    let request = PageRequest::new("read", 1, 50);

    let (a, b) = tokio::join!(fetcher.fetch_page(&request), fetcher.fetch_page(&request));

    assert_eq!(a.unwrap().body, b.unwrap().body);
    assert_eq!(api.calls(), 1);
}

/// Records the `If-None-Match` header it sees.
#[derive(Default)]
struct RecordingHook {
    seen: Vec<Option<String>>,
}

#[async_trait]
impl PreSendHook for RecordingHook {
    async fn before_send(&mut self, request: &mut OutgoingRequest) -> Result<Dispatch, FetchError> {
        self.seen
            .push(request.header("if-none-match").map(str::to_string));
        Ok(Dispatch::Send)
    }
}

#[tokio::test]
async fn test_outer_hook_runs_only_for_sent_requests() {
    let api = ScriptedApi::new().with_shelf("read", 1);
    let store = Arc::new(MemoryCacheStore::new());
    let request = PageRequest::new("read", 1, 50);
    let mut hook = RecordingHook::default();

    let caching = CachingFetcher::new(api.clone(), Arc::clone(&store));
    let exchange = caching.fetch_page_with(&request, &mut hook).await.unwrap();
    assert!(exchange.was_performed());
    let exchange = caching.fetch_page_with(&request, &mut hook).await.unwrap();
    assert!(!exchange.was_performed());
    assert_eq!(hook.seen, vec![None]);

    let revalidating = CachingFetcher::with_settings(api.clone(), store, refreshing());
    let exchange = revalidating.fetch_page_with(&request, &mut hook).await.unwrap();
    assert!(exchange.was_performed());
    assert_eq!(exchange.response().status, 200);
    assert_eq!(hook.seen[1].as_deref(), Some("\"read-1-v0\""));
}

/// A store whose disk is gone.
struct BrokenStore;

#[async_trait]
impl CacheStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<CacheEntry>, StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk gone")))
    }

    async fn put(&self, _entry: CacheEntry) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk gone")))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_store_failure_aborts_by_default() {
    let api = ScriptedApi::new().with_shelf("read", 3);
    let err = ReviewList::new(CachingFetcher::new(api.clone(), Arc::new(BrokenStore)))
        .list("read", 1, 2)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::CacheUnavailable(_)));
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_store_failure_can_be_bypassed() {
    let api = ScriptedApi::new().with_shelf("read", 3);
    let settings = CacheSettings {
        on_store_error: StoreErrorPolicy::Bypass,
        ..CacheSettings::default()
    };
    let reviews = ReviewList::new(CachingFetcher::with_settings(
        api.clone(),
        Arc::new(BrokenStore),
        settings,
    ))
    .list("read", 1, 2)
    .await
    .unwrap();

    assert_eq!(reviews.len(), 3);
    assert_eq!(api.calls(), 2);
}

/// Reads fine, refuses writes.
struct ReadOnlyStore(MemoryCacheStore);

#[async_trait]
impl CacheStore for ReadOnlyStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        self.0.get(key).await
    }

    async fn put(&self, _entry: CacheEntry) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("read-only")))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        self.0.len().await
    }
}

#[tokio::test]
async fn test_write_failure_aborts_by_default() {
    let api = ScriptedApi::new().with_shelf("read", 1);
    let fetcher = CachingFetcher::new(api.clone(), Arc::new(ReadOnlyStore(MemoryCacheStore::new())));

    let err = fetcher
        .fetch_page(&PageRequest::new("read", 1, 50))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::CacheUnavailable(_)));
    assert_eq!(api.calls(), 1);
}

/// Answers every request it sends with `304 Not Modified`.
struct AlwaysNotModified;

#[async_trait]
impl PageFetcher for AlwaysNotModified {
    async fn fetch_page_with(
        &self,
        request: &PageRequest,
        hook: &mut dyn PreSendHook,
    ) -> Result<Exchange, FetchError> {
        let mut outgoing = common::endpoint().request_for(request);
        match hook.before_send(&mut outgoing).await? {
            Dispatch::Skip(response) => Ok(Exchange::Skipped(response)),
            Dispatch::Send => Ok(Exchange::Performed(RawResponse::new(
                304,
                BTreeMap::new(),
                "",
            ))),
        }
    }
}

#[tokio::test]
async fn test_not_modified_without_cached_page_is_invalid() {
    let store = Arc::new(MemoryCacheStore::new());
    let fetcher = CachingFetcher::with_settings(AlwaysNotModified, Arc::clone(&store), refreshing());
    assert!(fetcher.settings().refresh);

    let err = fetcher
        .fetch_page(&PageRequest::new("read", 1, 50))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidResponse(_)));
    assert_eq!(store.len().await.unwrap(), 0);
}
