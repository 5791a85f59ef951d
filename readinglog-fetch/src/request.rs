//! Page requests and the review list endpoint.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use url::Url;

use crate::error::FetchError;

/// API version query parameter.
const API_VERSION: &str = "2";

/// Sort field for the review list.
const SORT: &str = "date_read";

/// Sort order for the review list (descending).
const ORDER: &str = "d";

// ============================================================================
// Page Request
// ============================================================================

/// One page of a shelf listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Shelf name.
    pub shelf: String,
    /// 1-based offset of the first record wanted.
    pub start: u32,
    /// Records per page.
    pub per_page: u32,
}

impl PageRequest {
    /// Creates a request.
    pub fn new(shelf: impl Into<String>, start: u32, per_page: u32) -> Self {
        Self {
            shelf: shelf.into(),
            start,
            per_page,
        }
    }

    /// 1-based page number containing `start`.
    pub fn page(&self) -> u32 {
        self.start.saturating_sub(1) / self.per_page.max(1) + 1
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// Builds review list URLs for one user.
#[derive(Clone)]
pub struct Endpoint {
    list_url: Url,
    key: String,
}

impl Endpoint {
    /// Creates an endpoint under `base_url` for `user_id`, authenticated with `key`.
    pub fn new(base_url: &str, user_id: &str, key: impl Into<String>) -> Result<Self, FetchError> {
        let file = format!("{user_id}.xml");
        let mut list_url = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidRequest(format!("base URL {base_url}: {e}")))?;
        list_url
            .path_segments_mut()
            .map_err(|()| FetchError::InvalidRequest(format!("base URL {base_url} cannot hold a path")))?
            .pop_if_empty()
            .extend(["review", "list", file.as_str()]);

        Ok(Self {
            list_url,
            key: key.into(),
        })
    }

    /// Full URL for one page.
    pub fn url_for(&self, request: &PageRequest) -> Url {
        let mut url = self.list_url.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.key)
            .append_pair("v", API_VERSION)
            .append_pair("shelf", &request.shelf)
            .append_pair("page", &request.page().to_string())
            .append_pair("per_page", &request.per_page.to_string())
            .append_pair("sort", SORT)
            .append_pair("order", ORDER);
        url
    }

    /// A header-less outgoing request for one page.
    pub fn request_for(&self, request: &PageRequest) -> OutgoingRequest {
        OutgoingRequest::new(self.url_for(request))
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("list_url", &self.list_url.as_str())
            .field("key", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Outgoing Request
// ============================================================================

/// A request about to be sent. Hooks may add headers before dispatch.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    url: Url,
    headers: HeaderMap,
}

impl OutgoingRequest {
    /// Creates a GET request for `url` with no extra headers.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Extra request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Reads a header as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets a header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), FetchError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| FetchError::InvalidRequest(format!("header {name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Path plus query string; identifies the resource in the HTTP cache.
    pub fn cache_key(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{query}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }

    /// URL with the `key` parameter masked, for logs and errors.
    pub fn redacted_url(&self) -> String {
        let mut url = self.url.clone();
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| {
                let v = if k == "key" { "***".into() } else { v };
                (k.into_owned(), v.into_owned())
            })
            .collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        url.to_string()
    }
}

// ============================================================================
// Raw Response
// ============================================================================

/// A response as seen on the wire, or reconstructed from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Headers with lowercase names.
    pub headers: BTreeMap<String, String>,
    /// Body text; empty for 304.
    pub body: String,
}

impl RawResponse {
    /// Creates a response.
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Returns true for `304 Not Modified`.
    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }

    /// The `ETag` header, if present.
    pub fn etag(&self) -> Option<&str> {
        self.headers.get("etag").map(String::as_str)
    }
}

impl From<readinglog_store::CacheEntry> for RawResponse {
    fn from(entry: readinglog_store::CacheEntry) -> Self {
        Self {
            status: entry.status,
            headers: entry.headers,
            body: entry.body,
        }
    }
}
