// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # readinglog Fetch
//!
//! Getting review pages off the network and into records.
//!
//! ## Layers
//!
//! - [`ApiClient`]: talks HTTP, retries transient failures
//! - [`CachingFetcher`]: wraps any [`PageFetcher`] with `ETag` revalidation
//!   over a [`CacheStore`](readinglog_store::CacheStore)
//! - [`ReviewList`]: walks the pagination windows and decodes every review
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use readinglog_fetch::{ApiClient, CachingFetcher, Endpoint, ReviewList};
//! use readinglog_store::FileCacheStore;
//!
//! let endpoint = Endpoint::new("https://www.goodreads.com", "42", "key")?;
//! let store = Arc::new(FileCacheStore::open("http_cache.json").await?);
//! let fetcher = CachingFetcher::new(ApiClient::new(endpoint)?, store);
//! let reviews = ReviewList::new(fetcher).list("read", 1, 50).await?;
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod request;
pub mod retry;
pub mod traversal;

pub use cache::{CacheSettings, CachingFetcher, StoreErrorPolicy};
pub use client::ApiClient;
pub use error::FetchError;
pub use fetcher::{Dispatch, Exchange, PageFetcher, PreSendHook, SendAlways};
pub use request::{Endpoint, OutgoingRequest, PageRequest, RawResponse};
pub use retry::RetryPolicy;
pub use traversal::{DEFAULT_PER_PAGE, DEFAULT_START, ReviewList};
