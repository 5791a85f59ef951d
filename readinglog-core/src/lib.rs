// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # readinglog Core
//!
//! Record types and XML decoding for the `readinglog` workspace.
//!
//! - [`xml`] - owned element tree with relative path lookup
//! - [`mapping`] - declarative attribute descriptors and the decoding engine
//! - [`models`] - the record kinds: [`Shelf`], [`Author`], [`Book`], [`Review`]
//! - [`page`] - pagination window and review extraction for one response
//!
//! ## Example
//!
//! ```ignore
//! use readinglog_core::ReviewPage;
//!
//! let page = ReviewPage::parse(&body)?;
//! for review in page.reviews()? {
//!     println!("{} ({})", review.book().title(), review.rating());
//! }
//! if page.has_more() {
//!     // fetch page.next_offset()
//! }
//! ```

pub mod error;
pub mod mapping;
pub mod models;
pub mod page;
pub mod xml;

pub use error::MappingError;
pub use mapping::{Attribute, Fields, Kind, Record, Schema, Value};
pub use models::{Author, Book, Review, Shelf};
pub use page::{ReviewPage, Window};
pub use xml::Element;
