//! Author records.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::MappingError;
use crate::mapping::{Attribute, Fields, Record, Schema};

/// Descriptor set for [`Author`].
pub static AUTHOR_SCHEMA: Schema = Schema {
    kind: "Author",
    attributes: &[
        Attribute::integer("id"),
        Attribute::text("name"),
        Attribute::text("role"),
        Attribute::uri("image_url"),
        Attribute::uri("small_image_url"),
        Attribute::uri("link"),
        Attribute::float("average_rating"),
        Attribute::integer("ratings_count"),
        Attribute::integer("text_reviews_count"),
    ],
};

/// A book author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    id: i64,
    name: String,
    role: String,
    image_url: Url,
    small_image_url: Url,
    link: Url,
    average_rating: f64,
    ratings_count: i64,
    text_reviews_count: i64,
}

impl Author {
    /// Author id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role on the book (often empty, e.g. `Translator`).
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Portrait URL.
    pub fn image_url(&self) -> &Url {
        &self.image_url
    }

    /// Small portrait URL.
    pub fn small_image_url(&self) -> &Url {
        &self.small_image_url
    }

    /// Author page URL.
    pub fn link(&self) -> &Url {
        &self.link
    }

    /// Average rating across the author's books.
    pub fn average_rating(&self) -> f64 {
        self.average_rating
    }

    /// Number of ratings.
    pub fn ratings_count(&self) -> i64 {
        self.ratings_count
    }

    /// Number of text reviews.
    pub fn text_reviews_count(&self) -> i64 {
        self.text_reviews_count
    }
}

impl Record for Author {
    fn schema() -> &'static Schema {
        &AUTHOR_SCHEMA
    }

    fn from_fields(mut f: Fields) -> Result<Self, MappingError> {
        Ok(Self {
            id: f.integer("id")?,
            name: f.text("name")?,
            role: f.text("role")?,
            image_url: f.uri("image_url")?,
            small_image_url: f.uri("small_image_url")?,
            link: f.uri("link")?,
            average_rating: f.float("average_rating")?,
            ratings_count: f.integer("ratings_count")?,
            text_reviews_count: f.integer("text_reviews_count")?,
        })
    }
}
