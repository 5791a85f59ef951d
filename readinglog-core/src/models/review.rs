//! Review records.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use url::Url;

use super::book::{BOOK_SCHEMA, Book};
use super::shelf::{SHELF_SCHEMA, Shelf};
use crate::error::MappingError;
use crate::mapping::{Attribute, Fields, Record, Schema};

/// Descriptor set for [`Review`].
pub static REVIEW_SCHEMA: Schema = Schema {
    kind: "Review",
    attributes: &[
        Attribute::integer("id"),
        Attribute::float("rating"),
        Attribute::integer("votes"),
        Attribute::boolean("spoiler_flag"),
        Attribute::text("spoilers_state"),
        Attribute::text("recommended_for"),
        Attribute::text("recommended_by"),
        Attribute::timestamp("started_at").nullable(),
        Attribute::timestamp("read_at"),
        Attribute::timestamp("date_added"),
        Attribute::timestamp("date_updated"),
        Attribute::integer("read_count"),
        Attribute::text("body"),
        Attribute::integer("comments_count"),
        Attribute::uri("url"),
        Attribute::uri("link"),
        Attribute::integer("owned"),
        Attribute::record("book", &BOOK_SCHEMA),
        Attribute::list("shelves", "shelves/shelf", &SHELF_SCHEMA),
    ],
};

/// One review on a user's shelf, with the reviewed book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    id: i64,
    rating: f64,
    votes: i64,
    spoiler_flag: bool,
    spoilers_state: String,
    recommended_for: String,
    recommended_by: String,
    started_at: Option<DateTime<FixedOffset>>,
    read_at: DateTime<FixedOffset>,
    date_added: DateTime<FixedOffset>,
    date_updated: DateTime<FixedOffset>,
    read_count: i64,
    body: String,
    comments_count: i64,
    url: Url,
    link: Url,
    owned: i64,
    book: Book,
    shelves: Vec<Shelf>,
}

impl Review {
    /// Review id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Star rating, `0` when unrated.
    pub fn rating(&self) -> f64 {
        self.rating
    }

    /// Number of likes.
    pub fn votes(&self) -> i64 {
        self.votes
    }

    /// Whether the review is flagged as containing spoilers.
    pub fn spoiler_flag(&self) -> bool {
        self.spoiler_flag
    }

    /// Spoiler state as reported by the API.
    pub fn spoilers_state(&self) -> &str {
        &self.spoilers_state
    }

    /// Who the reviewer recommends the book for.
    pub fn recommended_for(&self) -> &str {
        &self.recommended_for
    }

    /// Who recommended the book.
    pub fn recommended_by(&self) -> &str {
        &self.recommended_by
    }

    /// When reading started, if recorded.
    pub fn started_at(&self) -> Option<DateTime<FixedOffset>> {
        self.started_at
    }

    /// When the book was finished.
    pub fn read_at(&self) -> DateTime<FixedOffset> {
        self.read_at
    }

    /// When the book was added to the shelf.
    pub fn date_added(&self) -> DateTime<FixedOffset> {
        self.date_added
    }

    /// When the review was last updated.
    pub fn date_updated(&self) -> DateTime<FixedOffset> {
        self.date_updated
    }

    /// How many times the book was read.
    pub fn read_count(&self) -> i64 {
        self.read_count
    }

    /// Review text (HTML).
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Number of comments.
    pub fn comments_count(&self) -> i64 {
        self.comments_count
    }

    /// Review page URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Review link.
    pub fn link(&self) -> &Url {
        &self.link
    }

    /// Number of owned copies as reported by the API.
    pub fn owned(&self) -> i64 {
        self.owned
    }

    /// Whether the reviewer owns a copy.
    pub fn is_owned(&self) -> bool {
        self.owned > 0
    }

    /// The reviewed book.
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// Shelves the review is on, in document order.
    pub fn shelves(&self) -> &[Shelf] {
        &self.shelves
    }
}

impl Record for Review {
    fn schema() -> &'static Schema {
        &REVIEW_SCHEMA
    }

    fn from_fields(mut f: Fields) -> Result<Self, MappingError> {
        Ok(Self {
            id: f.integer("id")?,
            rating: f.float("rating")?,
            votes: f.integer("votes")?,
            spoiler_flag: f.boolean("spoiler_flag")?,
            spoilers_state: f.text("spoilers_state")?,
            recommended_for: f.text("recommended_for")?,
            recommended_by: f.text("recommended_by")?,
            started_at: f.timestamp_opt("started_at")?,
            read_at: f.timestamp("read_at")?,
            date_added: f.timestamp("date_added")?,
            date_updated: f.timestamp("date_updated")?,
            read_count: f.integer("read_count")?,
            body: f.text("body")?,
            comments_count: f.integer("comments_count")?,
            url: f.uri("url")?,
            link: f.uri("link")?,
            owned: f.integer("owned")?,
            book: f.record("book")?,
            shelves: f.list("shelves")?,
        })
    }
}
