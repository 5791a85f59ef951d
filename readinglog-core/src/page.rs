//! One page of the review list response.
//!
//! ```text
//! <GoodreadsResponse>
//!   <reviews start="1" end="50" total="125">
//!     <review>...</review>
//!   </reviews>
//! </GoodreadsResponse>
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MappingError;
use crate::mapping::Record;
use crate::models::Review;
use crate::xml::Element;

/// Path from the document root to the review elements.
const REVIEWS_PATH: &str = "reviews/review";

/// Position of one page within the full collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Window {
    /// 1-based offset of the first record on this page.
    pub start: u32,
    /// 1-based offset of the last record on this page.
    pub end: u32,
    /// Size of the whole collection.
    pub total: u32,
}

impl Window {
    /// Returns true if records remain after this page.
    pub fn has_more(&self) -> bool {
        self.end < self.total
    }

    /// Offset of the first record on the next page. Saturates at `u32::MAX`.
    pub fn next_offset(&self) -> u32 {
        self.end.saturating_add(1)
    }
}

/// A parsed response body: the pagination window plus the review elements.
#[derive(Debug, Clone)]
pub struct ReviewPage {
    document: Element,
    window: Window,
}

impl ReviewPage {
    /// Parses a response body.
    pub fn parse(body: &str) -> Result<Self, MappingError> {
        let document = Element::parse(body)?;
        let reviews = document
            .descendant("reviews")
            .ok_or(MappingError::MissingElement {
                kind: "ReviewPage",
                attribute: "reviews",
                path: "//reviews",
            })?;

        let window = Window {
            start: window_marker(reviews, "start")?,
            end: window_marker(reviews, "end")?,
            total: window_marker(reviews, "total")?,
        };
        debug!(
            start = window.start,
            end = window.end,
            total = window.total,
            "Parsed pagination window"
        );

        Ok(Self { document, window })
    }

    /// The pagination window of this page.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Returns true if records remain after this page.
    pub fn has_more(&self) -> bool {
        self.window.has_more()
    }

    /// Offset of the first record on the next page.
    pub fn next_offset(&self) -> u32 {
        self.window.next_offset()
    }

    /// Decodes the reviews on this page in document order.
    pub fn reviews(&self) -> Result<Vec<Review>, MappingError> {
        self.document
            .select(REVIEWS_PATH)
            .into_iter()
            .filter_map(|node| node.as_element())
            .map(Review::from_element)
            .collect()
    }
}

/// Reads one of the `start`/`end`/`total` attributes; absent means zero.
fn window_marker(reviews: &Element, name: &'static str) -> Result<u32, MappingError> {
    let Some(raw) = reviews.attribute(name) else {
        return Ok(0);
    };
    raw.trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| MappingError::InvalidValue {
            kind: "ReviewPage",
            attribute: name,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_markers() {
        let page = ReviewPage::parse(
            r#"<GoodreadsResponse><reviews start="1" end="2" total="3"></reviews></GoodreadsResponse>"#,
        )
        .unwrap();
        assert_eq!(page.window(), Window { start: 1, end: 2, total: 3 });
        assert!(page.has_more());
        assert_eq!(page.next_offset(), 3);
        assert!(page.reviews().unwrap().is_empty());
    }

    #[test]
    fn test_last_page() {
        let page = ReviewPage::parse(
            r#"<GoodreadsResponse><reviews start="3" end="3" total="3"/></GoodreadsResponse>"#,
        )
        .unwrap();
        assert!(!page.has_more());
    }

    #[test]
    fn test_next_offset_saturates() {
        let window = Window {
            start: 1,
            end: u32::MAX,
            total: u32::MAX,
        };
        assert_eq!(window.next_offset(), u32::MAX);
        assert!(!window.has_more());
    }

    #[test]
    fn test_absent_markers_are_zero() {
        let page =
            ReviewPage::parse("<GoodreadsResponse><reviews/></GoodreadsResponse>").unwrap();
        assert_eq!(page.window(), Window::default());
        assert!(!page.has_more());
    }

    #[test]
    fn test_missing_reviews_element() {
        let err = ReviewPage::parse("<GoodreadsResponse/>").unwrap_err();
        assert!(matches!(
            err,
            MappingError::MissingElement { attribute: "reviews", .. }
        ));
    }

    #[test]
    fn test_garbage_marker() {
        let err = ReviewPage::parse(
            r#"<GoodreadsResponse><reviews end="many"/></GoodreadsResponse>"#,
        )
        .unwrap_err();
        assert!(matches!(err, MappingError::InvalidValue { attribute: "end", .. }));
    }
}
