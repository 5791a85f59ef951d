// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # readinglog Store
//!
//! Everything `readinglog` keeps on disk:
//!
//! - **Cache**: the persistent HTTP response cache ([`CacheStore`],
//!   [`FileCacheStore`])
//! - **Settings**: user preferences and API credentials
//! - **Persistence**: atomic JSON/YAML file helpers
//!
//! ## Usage
//!
//! ```ignore
//! use readinglog_store::{CacheStore, FileCacheStore, Settings};
//!
//! let settings = Settings::load_default().await?;
//! let cache = FileCacheStore::open(&settings.cache_path).await?;
//! if let Some(entry) = cache.get("/review/list/1.xml?page=1").await? {
//!     println!("cached with etag {:?}", entry.validator);
//! }
//! ```

pub mod cache;
pub mod error;
pub mod persistence;
pub mod settings;

pub use cache::{CacheEntry, CacheStore, FileCacheStore, MemoryCacheStore};
pub use error::StoreError;
pub use persistence::{
    default_cache_path, default_config_dir, default_credentials_path, default_data_dir,
    default_data_path, default_settings_path, ensure_dir, load_json, load_json_or_default,
    load_yaml, save_json, write_atomic,
};
pub use settings::{Credentials, DEFAULT_BASE_URL, Settings};
