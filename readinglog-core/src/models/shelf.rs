//! Shelf records.

use serde::{Deserialize, Serialize};

use crate::error::MappingError;
use crate::mapping::{Attribute, Fields, Record, Schema};

/// Descriptor set for [`Shelf`]. Shelves carry their data as XML attributes.
pub static SHELF_SCHEMA: Schema = Schema {
    kind: "Shelf",
    attributes: &[
        Attribute::integer("id").at("@id"),
        Attribute::boolean("exclusive").at("@exclusive"),
        Attribute::text("name").at("@name"),
        Attribute::integer("review_shelf_id").at("@review_shelf_id").nullable(),
        Attribute::boolean("sortable").at("@sortable"),
    ],
};

/// A shelf a review has been placed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    id: i64,
    exclusive: bool,
    name: String,
    review_shelf_id: Option<i64>,
    sortable: bool,
}

impl Shelf {
    /// Shelf id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether the shelf is exclusive (a review sits on at most one such shelf).
    pub fn exclusive(&self) -> bool {
        self.exclusive
    }

    /// Shelf name, e.g. `read`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the review-to-shelf link, when the API provides one.
    pub fn review_shelf_id(&self) -> Option<i64> {
        self.review_shelf_id
    }

    /// Whether the shelf can be sorted.
    pub fn sortable(&self) -> bool {
        self.sortable
    }
}

impl Record for Shelf {
    fn schema() -> &'static Schema {
        &SHELF_SCHEMA
    }

    fn from_fields(mut f: Fields) -> Result<Self, MappingError> {
        Ok(Self {
            id: f.integer("id")?,
            exclusive: f.boolean("exclusive")?,
            name: f.text("name")?,
            review_shelf_id: f.integer_opt("review_shelf_id")?,
            sortable: f.boolean("sortable")?,
        })
    }
}
