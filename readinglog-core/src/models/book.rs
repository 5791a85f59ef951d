//! Book records.

use serde::{Deserialize, Serialize};
use url::Url;

use super::author::{AUTHOR_SCHEMA, Author};
use crate::error::MappingError;
use crate::mapping::{Attribute, Fields, Record, Schema};

/// Descriptor set for [`Book`].
pub static BOOK_SCHEMA: Schema = Schema {
    kind: "Book",
    attributes: &[
        Attribute::integer("id"),
        Attribute::text("isbn"),
        Attribute::text("isbn13"),
        Attribute::integer("text_reviews_count"),
        Attribute::uri("uri"),
        Attribute::text("title"),
        Attribute::text("title_without_series"),
        Attribute::uri("image_url"),
        Attribute::uri("small_image_url").nullable(),
        Attribute::uri("large_image_url").nullable(),
        Attribute::uri("link"),
        Attribute::integer("num_pages"),
        Attribute::text("format"),
        Attribute::text("edition_information"),
        Attribute::text("publisher"),
        Attribute::integer("publication_day"),
        Attribute::integer("publication_year"),
        Attribute::integer("publication_month"),
        Attribute::float("average_rating"),
        Attribute::integer("ratings_count"),
        Attribute::text("description"),
        Attribute::integer("published"),
        Attribute::list("authors", "authors/author", &AUTHOR_SCHEMA),
    ],
};

/// A book as embedded in a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    id: i64,
    isbn: String,
    isbn13: String,
    text_reviews_count: i64,
    uri: Url,
    title: String,
    title_without_series: String,
    image_url: Url,
    small_image_url: Option<Url>,
    large_image_url: Option<Url>,
    link: Url,
    num_pages: i64,
    format: String,
    edition_information: String,
    publisher: String,
    publication_day: i64,
    publication_year: i64,
    publication_month: i64,
    average_rating: f64,
    ratings_count: i64,
    description: String,
    published: i64,
    authors: Vec<Author>,
}

impl Book {
    /// Book id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// ISBN-10 (may be empty).
    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    /// ISBN-13 (may be empty).
    pub fn isbn13(&self) -> &str {
        &self.isbn13
    }

    /// Number of text reviews.
    pub fn text_reviews_count(&self) -> i64 {
        self.text_reviews_count
    }

    /// Canonical URI, e.g. `kca://book/...`.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Full title, including the series.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Title without the series suffix.
    pub fn title_without_series(&self) -> &str {
        &self.title_without_series
    }

    /// Cover image URL.
    pub fn image_url(&self) -> &Url {
        &self.image_url
    }

    /// Small cover image URL.
    pub fn small_image_url(&self) -> Option<&Url> {
        self.small_image_url.as_ref()
    }

    /// Large cover image URL.
    pub fn large_image_url(&self) -> Option<&Url> {
        self.large_image_url.as_ref()
    }

    /// Book page URL.
    pub fn link(&self) -> &Url {
        &self.link
    }

    /// Page count.
    pub fn num_pages(&self) -> i64 {
        self.num_pages
    }

    /// Format, e.g. `Paperback`.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Edition information.
    pub fn edition_information(&self) -> &str {
        &self.edition_information
    }

    /// Publisher.
    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    /// Day of the month of publication.
    pub fn publication_day(&self) -> i64 {
        self.publication_day
    }

    /// Year of publication.
    pub fn publication_year(&self) -> i64 {
        self.publication_year
    }

    /// Month of publication.
    pub fn publication_month(&self) -> i64 {
        self.publication_month
    }

    /// Average rating.
    pub fn average_rating(&self) -> f64 {
        self.average_rating
    }

    /// Number of ratings.
    pub fn ratings_count(&self) -> i64 {
        self.ratings_count
    }

    /// Description (HTML).
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Year of first publication.
    pub fn published(&self) -> i64 {
        self.published
    }

    /// Authors in document order.
    pub fn authors(&self) -> &[Author] {
        &self.authors
    }
}

impl Record for Book {
    fn schema() -> &'static Schema {
        &BOOK_SCHEMA
    }

    fn from_fields(mut f: Fields) -> Result<Self, MappingError> {
        Ok(Self {
            id: f.integer("id")?,
            isbn: f.text("isbn")?,
            isbn13: f.text("isbn13")?,
            text_reviews_count: f.integer("text_reviews_count")?,
            uri: f.uri("uri")?,
            title: f.text("title")?,
            title_without_series: f.text("title_without_series")?,
            image_url: f.uri("image_url")?,
            small_image_url: f.uri_opt("small_image_url")?,
            large_image_url: f.uri_opt("large_image_url")?,
            link: f.uri("link")?,
            num_pages: f.integer("num_pages")?,
            format: f.text("format")?,
            edition_information: f.text("edition_information")?,
            publisher: f.text("publisher")?,
            publication_day: f.integer("publication_day")?,
            publication_year: f.integer("publication_year")?,
            publication_month: f.integer("publication_month")?,
            average_rating: f.float("average_rating")?,
            ratings_count: f.integer("ratings_count")?,
            description: f.text("description")?,
            published: f.integer("published")?,
            authors: f.list("authors")?,
        })
    }
}
