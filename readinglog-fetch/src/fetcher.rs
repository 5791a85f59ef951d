//! The page fetcher seam.
//!
//! A [`PageFetcher`] turns a [`PageRequest`] into a [`RawResponse`]. Before
//! anything goes on the wire, the fetcher hands the outgoing request to a
//! [`PreSendHook`], which may add headers or answer the request itself.
//! Decorators such as the caching layer wrap another fetcher and install
//! their own hook.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::request::{OutgoingRequest, PageRequest, RawResponse};

/// What a hook decided about an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Send the request as it now stands.
    Send,
    /// Do not send; use this response instead.
    Skip(RawResponse),
}

/// Outcome of a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// The request went over the network.
    Performed(RawResponse),
    /// A hook supplied the response and nothing was sent.
    Skipped(RawResponse),
}

impl Exchange {
    /// The response, however it was obtained.
    pub fn response(&self) -> &RawResponse {
        match self {
            Exchange::Performed(response) | Exchange::Skipped(response) => response,
        }
    }

    /// Consumes the exchange, returning the response.
    pub fn into_response(self) -> RawResponse {
        match self {
            Exchange::Performed(response) | Exchange::Skipped(response) => response,
        }
    }

    /// Returns true if a network call was made.
    pub fn was_performed(&self) -> bool {
        matches!(self, Exchange::Performed(_))
    }
}

/// Runs right before a request is dispatched.
#[async_trait]
pub trait PreSendHook: Send {
    /// Inspects or amends the request and decides whether to send it.
    async fn before_send(&mut self, request: &mut OutgoingRequest) -> Result<Dispatch, FetchError>;
}

/// Hook that always sends.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendAlways;

#[async_trait]
impl PreSendHook for SendAlways {
    async fn before_send(&mut self, _request: &mut OutgoingRequest) -> Result<Dispatch, FetchError> {
        Ok(Dispatch::Send)
    }
}

/// Fetches one page of a shelf listing.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a page, consulting `hook` before dispatch.
    async fn fetch_page_with(
        &self,
        request: &PageRequest,
        hook: &mut dyn PreSendHook,
    ) -> Result<Exchange, FetchError>;

    /// Fetches a page with no outer hook.
    async fn fetch_page(&self, request: &PageRequest) -> Result<RawResponse, FetchError> {
        let mut hook = SendAlways;
        Ok(self.fetch_page_with(request, &mut hook).await?.into_response())
    }
}

#[async_trait]
impl<F: PageFetcher + ?Sized> PageFetcher for std::sync::Arc<F> {
    async fn fetch_page_with(
        &self,
        request: &PageRequest,
        hook: &mut dyn PreSendHook,
    ) -> Result<Exchange, FetchError> {
        (**self).fetch_page_with(request, hook).await
    }
}
