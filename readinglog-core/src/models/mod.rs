//! Record kinds decoded from the review list API.
//!
//! ## Submodules
//!
//! - [`shelf`] - [`Shelf`], read from `<shelf>` XML attributes
//! - [`author`] - [`Author`]
//! - [`book`] - [`Book`] with its authors
//! - [`review`] - [`Review`] with its book and shelves
//!
//! Every record is built in one step from decoded fields and exposes its
//! values through accessors only.

mod author;
mod book;
mod review;
mod shelf;

pub use author::{AUTHOR_SCHEMA, Author};
pub use book::{BOOK_SCHEMA, Book};
pub use review::{REVIEW_SCHEMA, Review};
pub use shelf::{SHELF_SCHEMA, Shelf};
