//! Scripted API for fetch tests.

#![allow(dead_code)]

use async_trait::async_trait;
use readinglog_fetch::{
    Dispatch, Endpoint, Exchange, FetchError, PageFetcher, PageRequest, PreSendHook, RawResponse,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// One review element with the given id.
pub fn review_xml(id: u32) -> String {
    format!(
        r#"<review>
  <id>{id}</id>
  <book>
    <id>{id}</id>
    <isbn></isbn>
    <isbn13></isbn13>
    <text_reviews_count>0</text_reviews_count>
    <uri>kca://book/{id}</uri>
    <title>Book {id}</title>
    <title_without_series>Book {id}</title_without_series>
    <image_url>https://example.com/{id}.jpg</image_url>
    <link>https://example.com/book/{id}</link>
    <num_pages>100</num_pages>
    <format></format>
    <edition_information></edition_information>
    <publisher></publisher>
    <publication_day>1</publication_day>
    <publication_year>2001</publication_year>
    <publication_month>1</publication_month>
    <average_rating>3.5</average_rating>
    <ratings_count>10</ratings_count>
    <description></description>
    <published>2001</published>
  </book>
  <rating>3</rating>
  <votes>0</votes>
  <spoiler_flag>false</spoiler_flag>
  <spoilers_state>none</spoilers_state>
  <shelves>
    <shelf name="read" exclusive="true" id="1" review_shelf_id="" sortable="false"/>
  </shelves>
  <recommended_for></recommended_for>
  <recommended_by></recommended_by>
  <started_at></started_at>
  <read_at>Sat Mar 02 00:00:00 -0800 2019</read_at>
  <date_added>Fri Mar 01 10:00:00 -0800 2019</date_added>
  <date_updated>Sat Mar 02 10:00:00 -0800 2019</date_updated>
  <read_count>1</read_count>
  <body></body>
  <comments_count>0</comments_count>
  <url>https://example.com/review/{id}</url>
  <link>https://example.com/review/{id}</link>
  <owned>0</owned>
</review>"#
    )
}

/// A full response body holding reviews `start..=end` of `total`.
pub fn page_xml(start: u32, end: u32, total: u32) -> String {
    let reviews: String = (start..=end).map(review_xml).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<GoodreadsResponse>
  <reviews start="{start}" end="{end}" total="{total}">{reviews}</reviews>
</GoodreadsResponse>"#
    )
}

/// Test endpoint.
pub fn endpoint() -> Endpoint {
    Endpoint::new("https://api.example.test", "42", "test-key").expect("valid endpoint")
}

#[derive(Debug, Default)]
struct State {
    totals: HashMap<String, u32>,
    versions: HashMap<String, u32>,
    broken_offsets: HashMap<u32, String>,
    sent: Vec<PageRequest>,
    conditional: Vec<String>,
}

/// In-memory API with shelves of generated reviews.
///
/// Every response carries an `ETag` derived from shelf, page, and shelf
/// version; a matching `If-None-Match` gets `304` with an empty body.
#[derive(Debug, Clone)]
pub struct ScriptedApi {
    endpoint: Endpoint,
    state: Arc<Mutex<State>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            endpoint: endpoint(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Adds a shelf with `total` reviews, ids `1..=total`.
    pub fn with_shelf(self, shelf: &str, total: u32) -> Self {
        self.state.lock().unwrap().totals.insert(shelf.to_string(), total);
        self
    }

    /// Serves `body` instead of the generated page for `offset`.
    pub fn with_body_at(self, offset: u32, body: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .broken_offsets
            .insert(offset, body.to_string());
        self
    }

    /// Changes every `ETag` on `shelf`.
    pub fn touch(&self, shelf: &str) {
        *self
            .state
            .lock()
            .unwrap()
            .versions
            .entry(shelf.to_string())
            .or_default() += 1;
    }

    /// Requests that reached the network.
    pub fn sent(&self) -> Vec<PageRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Number of requests that reached the network.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().sent.len()
    }

    /// `If-None-Match` values seen on the wire.
    pub fn conditional(&self) -> Vec<String> {
        self.state.lock().unwrap().conditional.clone()
    }

    fn respond(&self, request: &PageRequest, if_none_match: Option<String>) -> RawResponse {
        let mut state = self.state.lock().unwrap();
        state.sent.push(request.clone());

        let total = state.totals.get(&request.shelf).copied().unwrap_or(0);
        let version = state.versions.get(&request.shelf).copied().unwrap_or(0);
        let etag = format!("\"{}-{}-v{version}\"", request.shelf, request.page());

        if let Some(value) = if_none_match {
            state.conditional.push(value.clone());
            if value == etag {
                return RawResponse::new(304, BTreeMap::new(), "");
            }
        }

        let mut headers = BTreeMap::new();
        headers.insert("etag".to_string(), etag);
        headers.insert("content-type".to_string(), "application/xml".to_string());

        if let Some(body) = state.broken_offsets.get(&request.start) {
            return RawResponse::new(200, headers, body.clone());
        }

        let first = (request.page() - 1) * request.per_page + 1;
        let body = if total == 0 || first > total {
            page_xml_empty(total)
        } else {
            page_xml(first, (first + request.per_page - 1).min(total), total)
        };
        RawResponse::new(200, headers, body)
    }
}

fn page_xml_empty(total: u32) -> String {
    format!(r#"<GoodreadsResponse><reviews start="0" end="0" total="{total}"/></GoodreadsResponse>"#)
}

#[async_trait]
impl PageFetcher for ScriptedApi {
    async fn fetch_page_with(
        &self,
        request: &PageRequest,
        hook: &mut dyn PreSendHook,
    ) -> Result<Exchange, FetchError> {
        let mut outgoing = self.endpoint.request_for(request);
        match hook.before_send(&mut outgoing).await? {
            Dispatch::Skip(response) => Ok(Exchange::Skipped(response)),
            Dispatch::Send => {
                let if_none_match = outgoing.header("if-none-match").map(str::to_string);
                Ok(Exchange::Performed(self.respond(request, if_none_match)))
            }
        }
    }
}
