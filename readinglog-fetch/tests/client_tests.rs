//! HTTP client tests against a local mock server.

use async_trait::async_trait;
use readinglog_fetch::{
    ApiClient, Dispatch, Endpoint, Exchange, FetchError, OutgoingRequest, PageFetcher,
    PageRequest, PreSendHook, RawResponse, RetryPolicy, SendAlways,
};
use reqwest::header::IF_NONE_MATCH;
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PATH: &str = "/review/list/42.xml";
const BODY: &str = r#"<GoodreadsResponse><reviews start="0" end="0" total="0"/></GoodreadsResponse>"#;

fn client(server: &MockServer, attempts: u32) -> ApiClient {
    let endpoint = Endpoint::new(&server.uri(), "42", "secret-key").unwrap();
    ApiClient::new(endpoint)
        .unwrap()
        .with_retry_policy(RetryPolicy::new(attempts).with_base_delay(Duration::ZERO))
}

fn first_page() -> PageRequest {
    PageRequest::new("read", 1, 50)
}

#[tokio::test]
async fn test_page_is_fetched_with_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("key", "secret-key"))
        .and(query_param("v", "2"))
        .and(query_param("shelf", "read"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "50"))
        .and(query_param("sort", "date_read"))
        .and(query_param("order", "d"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("etag", "\"v1\"")
                .set_body_string(BODY),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 1);
    let exchange = client
        .fetch_page_with(&first_page(), &mut SendAlways)
        .await
        .unwrap();

    assert!(exchange.was_performed());
    let response = exchange.into_response();
    assert_eq!(response.status, 200);
    assert_eq!(response.etag(), Some("\"v1\""));
    assert_eq!(response.body, BODY);
}

#[tokio::test]
async fn test_not_modified_is_returned_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, 3).fetch_page(&first_page()).await.unwrap();
    assert!(response.is_not_modified());
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_client_error_is_not_retried_and_hides_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3).fetch_page(&first_page()).await.unwrap_err();
    match err {
        FetchError::Status { status, url } => {
            assert_eq!(status, 404);
            assert!(!url.contains("secret-key"), "key leaked into {url}");
            assert!(url.contains("shelf=read"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, 3).fetch_page(&first_page()).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, BODY);
}

#[tokio::test]
async fn test_retries_stop_at_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server, 2).fetch_page(&first_page()).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_rate_limit_honours_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, 2).fetch_page(&first_page()).await.unwrap();
    assert_eq!(response.status, 200);
}

/// Adds a fixed `If-None-Match` validator.
struct Validator(&'static str);

#[async_trait]
impl PreSendHook for Validator {
    async fn before_send(&mut self, request: &mut OutgoingRequest) -> Result<Dispatch, FetchError> {
        request.set_header(IF_NONE_MATCH, self.0)?;
        Ok(Dispatch::Send)
    }
}

#[tokio::test]
async fn test_hook_headers_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(header("if-none-match", "\"abc\""))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;

    let exchange = client(&server, 1)
        .fetch_page_with(&first_page(), &mut Validator("\"abc\""))
        .await
        .unwrap();
    assert_eq!(exchange.response().status, 304);
}

/// Answers every request itself.
struct Answer;

#[async_trait]
impl PreSendHook for Answer {
    async fn before_send(&mut self, _request: &mut OutgoingRequest) -> Result<Dispatch, FetchError> {
        Ok(Dispatch::Skip(RawResponse::new(200, BTreeMap::new(), BODY)))
    }
}

#[tokio::test]
async fn test_skipped_request_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server, 1);
    let exchange = client.fetch_page_with(&first_page(), &mut Answer).await.unwrap();

    assert!(matches!(exchange, Exchange::Skipped(_)));
    assert_eq!(exchange.response().body, BODY);
    let url = client.endpoint().url_for(&first_page());
    assert!(url.as_str().starts_with(&server.uri()));
    assert_eq!(url.path(), LIST_PATH);
}
