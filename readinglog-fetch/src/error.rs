//! Fetch error types.

use readinglog_core::MappingError;
use readinglog_store::StoreError;
use thiserror::Error;

/// Error type for fetch operations.
///
/// Any of these aborts a whole review list traversal; no partial list is
/// returned.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (connect, TLS, timeout, body read).
    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a status other than 2xx or 304.
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request URL with the API key redacted.
        url: String,
    },

    /// A response body could not be decoded into records.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// The persistent cache could not be read or written.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(#[from] StoreError),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response was well-formed but made no sense in context.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A page did not move the offset forward.
    #[error("Pagination stalled at offset {offset} (next offset {next})")]
    Stalled {
        /// Offset of the page that was fetched.
        offset: u32,
        /// Next offset the page reported.
        next: u32,
    },

    /// The traversal was cancelled before the next page was requested.
    #[error("Cancelled")]
    Cancelled,
}

impl FetchError {
    /// Returns true for transport and HTTP status failures.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Status { .. })
    }
}
