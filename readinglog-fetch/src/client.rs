//! HTTP client for the review list API.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;
use crate::fetcher::{Dispatch, Exchange, PageFetcher, PreSendHook};
use crate::request::{Endpoint, OutgoingRequest, PageRequest, RawResponse};
use crate::retry::RetryPolicy;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches pages straight from the API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Client,
    endpoint: Endpoint,
    retry_policy: RetryPolicy,
}

impl ApiClient {
    /// Creates a client with the default timeout and retry policy.
    pub fn new(endpoint: Endpoint) -> Result<Self, FetchError> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with a custom timeout.
    pub fn with_timeout(endpoint: Endpoint, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("readinglog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: client,
            endpoint,
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Sets the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// The endpoint requests are built against.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Sends a GET, retrying transient failures. 2xx and 304 are success.
    async fn send(&self, request: &OutgoingRequest) -> Result<RawResponse, FetchError> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(url = %request.redacted_url(), attempt = attempts, "Making GET request");

            let result = self
                .inner
                .get(request.url().clone())
                .headers(request.headers().clone())
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() || status == StatusCode::NOT_MODIFIED {
                        return read_response(response).await;
                    }

                    if self.retry_policy.retries_status(status)
                        && self.retry_policy.allows_retry(attempts)
                    {
                        let delay = retry_after(&response)
                            .map(|d| d.min(self.retry_policy.max_delay))
                            .unwrap_or_else(|| self.retry_policy.delay_for_attempt(attempts));
                        warn!(
                            status = status.as_u16(),
                            delay_secs = delay.as_secs(),
                            "Server refused request, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url: request.redacted_url(),
                    });
                }
                Err(e) => {
                    if self.retry_policy.allows_retry(attempts) && self.retry_policy.retries_error(&e)
                    {
                        let delay = self.retry_policy.delay_for_attempt(attempts);
                        warn!(
                            error = %e,
                            delay_secs = delay.as_secs(),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(e.without_url().into());
                }
            }
        }
    }
}

#[async_trait]
impl PageFetcher for ApiClient {
    #[instrument(skip(self, hook), fields(shelf = %request.shelf, page = request.page()))]
    async fn fetch_page_with(
        &self,
        request: &PageRequest,
        hook: &mut dyn PreSendHook,
    ) -> Result<Exchange, FetchError> {
        let mut outgoing = self.endpoint.request_for(request);

        match hook.before_send(&mut outgoing).await? {
            Dispatch::Skip(response) => {
                debug!("Request answered before dispatch");
                Ok(Exchange::Skipped(response))
            }
            Dispatch::Send => {
                info!(url = %outgoing.redacted_url(), "Fetching page");
                let response = self.send(&outgoing).await?;
                debug!(status = response.status, bytes = response.body.len(), "Page received");
                Ok(Exchange::Performed(response))
            }
        }
    }
}

/// Collects status, headers, and body.
async fn read_response(response: Response) -> Result<RawResponse, FetchError> {
    let status = response.status().as_u16();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.text().await.map_err(reqwest::Error::without_url)?;

    Ok(RawResponse::new(status, headers, body))
}

/// Parses a `Retry-After` header given in seconds.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_secs)
}
