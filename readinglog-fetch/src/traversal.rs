//! Walking a shelf page by page.

use async_trait::async_trait;
use readinglog_core::{Review, ReviewPage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::error::FetchError;
use crate::fetcher::{Exchange, PageFetcher, PreSendHook};
use crate::request::PageRequest;

/// Offset of the first record in a listing.
pub const DEFAULT_START: u32 = 1;

/// Records per page when the caller has no preference.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Collects every review on a shelf, one page at a time.
///
/// Pages are requested sequentially. Any failure aborts the whole listing;
/// no partial list is returned. A `ReviewList` is itself a [`PageFetcher`]
/// that refuses to fetch once cancelled, so it can sit at the top of a
/// fetcher stack.
#[derive(Debug)]
pub struct ReviewList<F> {
    fetcher: F,
    cancel: CancellationToken,
}

impl<F: PageFetcher> ReviewList<F> {
    /// Creates a listing over `fetcher`.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cancel: CancellationToken::new(),
        }
    }

    /// Checks `token` before every page request.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The underlying fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Lists `shelf` from offset 1 with 50 records per page.
    pub async fn list_all(&self, shelf: &str) -> Result<Vec<Review>, FetchError> {
        self.list(shelf, DEFAULT_START, DEFAULT_PER_PAGE).await
    }

    /// Lists `shelf` starting at the 1-based offset `start`.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        shelf: &str,
        start: u32,
        per_page: u32,
    ) -> Result<Vec<Review>, FetchError> {
        if per_page == 0 {
            return Err(FetchError::InvalidRequest(
                "per_page must be at least 1".to_string(),
            ));
        }

        let mut offset = start.max(DEFAULT_START);
        let mut reviews = Vec::new();
        let mut pages = 0u32;

        loop {
            let request = PageRequest::new(shelf, offset, per_page);
            let response = self.fetch_page(&request).await?;
            let page = ReviewPage::parse(&response.body)?;
            let mut records = page.reviews()?;
            pages += 1;

            let window = page.window();
            debug!(
                start = window.start,
                end = window.end,
                total = window.total,
                records = records.len(),
                "Page decoded"
            );
            reviews.append(&mut records);

            if !page.has_more() {
                break;
            }

            let next = page.next_offset();
            if next <= offset {
                return Err(FetchError::Stalled { offset, next });
            }
            offset = next;
        }

        info!(pages, records = reviews.len(), "Listing complete");
        Ok(reviews)
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for ReviewList<F> {
    async fn fetch_page_with(
        &self,
        request: &PageRequest,
        hook: &mut dyn PreSendHook,
    ) -> Result<Exchange, FetchError> {
        if self.cancel.is_cancelled() {
            info!(offset = request.start, "Listing cancelled");
            return Err(FetchError::Cancelled);
        }
        self.fetcher.fetch_page_with(request, hook).await
    }
}
