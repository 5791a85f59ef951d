//! Core error types for `readinglog`.

use thiserror::Error;

/// Error raised while turning an XML document into records.
///
/// Any of these aborts decoding of the page that produced it.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The document is not well-formed XML.
    #[error("Malformed XML: {0}")]
    Xml(String),

    /// A required element or XML attribute was not found.
    #[error("{kind}.{attribute}: nothing found at `{path}`")]
    MissingElement {
        /// Record kind being decoded.
        kind: &'static str,
        /// Attribute that failed.
        attribute: &'static str,
        /// Source path that resolved to nothing.
        path: &'static str,
    },

    /// A value was present but could not be parsed as its declared kind.
    #[error("{kind}.{attribute}: invalid value {value:?} ({reason})")]
    InvalidValue {
        /// Record kind being decoded.
        kind: &'static str,
        /// Attribute that failed.
        attribute: &'static str,
        /// Raw text that was rejected.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A decoded field did not have the shape the record expected.
    #[error("{kind}.{attribute}: expected {expected}")]
    FieldType {
        /// Record kind being built.
        kind: &'static str,
        /// Attribute that failed.
        attribute: &'static str,
        /// Expected value kind.
        expected: &'static str,
    },
}

impl From<quick_xml::Error> for MappingError {
    fn from(err: quick_xml::Error) -> Self {
        MappingError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for MappingError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        MappingError::Xml(err.to_string())
    }
}
