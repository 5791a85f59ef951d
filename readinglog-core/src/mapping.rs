//! Declarative XML-to-record mapping.
//!
//! Each record kind declares a static [`Schema`]: a list of [`Attribute`]
//! descriptors naming where a value lives in the XML and how to decode it.
//! [`Schema::decode`] turns one element into [`Fields`], and the record's
//! [`Record::from_fields`] moves those values into an immutable struct.
//!
//! ## Decoding rules
//!
//! | kind        | rule                                                        |
//! |-------------|-------------------------------------------------------------|
//! | `Text`      | text passed through                                         |
//! | `Integer`   | trimmed text parsed as `i64`; blank is `0`                  |
//! | `Float`     | trimmed text parsed as `f64`; blank is `0.0`                |
//! | `Boolean`   | `true` iff the text is exactly `"true"`                     |
//! | `Timestamp` | RFC 3339, RFC 2822, or `Tue Jan 23 10:47:23 -0800 2018`     |
//! | `Uri`       | trimmed text parsed as an absolute URL                      |
//! | `Record`    | first matching element, decoded with the nested schema      |
//! | `List`      | every matching element in document order                    |
//!
//! Blank text for a numeric, timestamp, or URI attribute decodes to
//! [`Value::Null`] when the attribute is nullable. Otherwise blank numbers
//! decode to zero and blank timestamps or URIs fail.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use tracing::trace;
use url::Url;

use crate::error::MappingError;
use crate::xml::{Element, Node};

/// Format used by the API for review timestamps.
const API_TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

// ============================================================================
// Descriptors
// ============================================================================

/// How an attribute's value is decoded.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// Plain string.
    Text,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// Boolean flag.
    Boolean,
    /// Date and time with offset.
    Timestamp,
    /// Absolute URL.
    Uri,
    /// A nested record.
    Record(&'static Schema),
    /// Zero or more nested records.
    List(&'static Schema),
}

/// Describes how one field of a record kind is located and decoded.
#[derive(Debug, Clone, Copy)]
pub struct Attribute {
    /// Field name.
    pub name: &'static str,
    /// Value kind.
    pub kind: Kind,
    /// Source path relative to the record's element.
    pub path: &'static str,
    /// Value used when the path resolves to nothing.
    pub default: Option<fn() -> Value>,
    /// Whether the value may be absent.
    pub nullable: bool,
}

impl Attribute {
    /// Creates a required attribute read from the child element of the same name.
    pub const fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            path: name,
            default: None,
            nullable: false,
        }
    }

    /// A text attribute.
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, Kind::Text)
    }

    /// An integer attribute.
    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, Kind::Integer)
    }

    /// A float attribute.
    pub const fn float(name: &'static str) -> Self {
        Self::new(name, Kind::Float)
    }

    /// A boolean attribute.
    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, Kind::Boolean)
    }

    /// A timestamp attribute.
    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, Kind::Timestamp)
    }

    /// A URI attribute.
    pub const fn uri(name: &'static str) -> Self {
        Self::new(name, Kind::Uri)
    }

    /// A nested record attribute.
    pub const fn record(name: &'static str, schema: &'static Schema) -> Self {
        Self::new(name, Kind::Record(schema))
    }

    /// A list attribute; an empty list when nothing matches.
    pub const fn list(name: &'static str, path: &'static str, schema: &'static Schema) -> Self {
        Self {
            name,
            kind: Kind::List(schema),
            path,
            default: Some(empty_list),
            nullable: false,
        }
    }

    /// Overrides the source path.
    pub const fn at(mut self, path: &'static str) -> Self {
        self.path = path;
        self
    }

    /// Marks the attribute as nullable.
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    fn decode(&self, schema: &Schema, element: &Element) -> Result<Value, MappingError> {
        if let Kind::List(nested) = self.kind {
            return self.decode_list(element, nested);
        }

        let Some(node) = element.select_first(self.path) else {
            return self.absent(schema);
        };

        match self.kind {
            Kind::Text => Ok(Value::Text(node.text().to_string())),
            Kind::Boolean => Ok(Value::Boolean(node.text() == "true")),
            Kind::Integer => self.parse_text(schema, node, Some(Value::Integer(0)), |t| {
                t.parse::<i64>().map(Value::Integer).map_err(|e| e.to_string())
            }),
            Kind::Float => self.parse_text(schema, node, Some(Value::Float(0.0)), |t| {
                t.parse::<f64>().map(Value::Float).map_err(|e| e.to_string())
            }),
            Kind::Timestamp => self.parse_text(schema, node, None, |t| {
                parse_timestamp(t).map(Value::Timestamp)
            }),
            Kind::Uri => self.parse_text(schema, node, None, |t| {
                Url::parse(t).map(Value::Uri).map_err(|e| e.to_string())
            }),
            Kind::Record(nested) => match node.as_element() {
                Some(el) => Ok(Value::Record(nested.decode(el)?)),
                None => Err(MappingError::FieldType {
                    kind: schema.kind,
                    attribute: self.name,
                    expected: "element",
                }),
            },
            Kind::List(nested) => self.decode_list(element, nested),
        }
    }

    fn decode_list(&self, element: &Element, nested: &Schema) -> Result<Value, MappingError> {
        let items = element
            .select(self.path)
            .into_iter()
            .filter_map(|node| node.as_element())
            .map(|el| nested.decode(el))
            .collect::<Result<Vec<_>, _>>()?;
        if items.is_empty() {
            return Ok(self.default.map_or(Value::List(Vec::new()), |f| f()));
        }
        Ok(Value::List(items))
    }

    fn absent(&self, schema: &Schema) -> Result<Value, MappingError> {
        if let Some(default) = self.default {
            return Ok(default());
        }
        if self.nullable {
            return Ok(Value::Null);
        }
        Err(MappingError::MissingElement {
            kind: schema.kind,
            attribute: self.name,
            path: self.path,
        })
    }

    /// Parses trimmed text. Blank text is `Null` when nullable, else `blank`
    /// if the kind has a zero value, else an error.
    fn parse_text(
        &self,
        schema: &Schema,
        node: Node<'_>,
        blank: Option<Value>,
        parse: impl FnOnce(&str) -> Result<Value, String>,
    ) -> Result<Value, MappingError> {
        let raw = node.text();
        let text = raw.trim();
        if text.is_empty() {
            if self.nullable {
                return Ok(Value::Null);
            }
            return blank.ok_or_else(|| self.invalid(schema, raw, "empty value".to_string()));
        }
        parse(text).map_err(|reason| self.invalid(schema, raw, reason))
    }

    fn invalid(&self, schema: &Schema, raw: &str, reason: String) -> MappingError {
        MappingError::InvalidValue {
            kind: schema.kind,
            attribute: self.name,
            value: raw.to_string(),
            reason,
        }
    }
}

fn empty_list() -> Value {
    Value::List(Vec::new())
}

/// Parses the timestamp formats seen in API responses.
pub fn parse_timestamp(text: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_str(text, API_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .map_err(|e| e.to_string())
}

// ============================================================================
// Schema
// ============================================================================

/// The descriptor set of one record kind.
#[derive(Debug)]
pub struct Schema {
    /// Record kind name, e.g. `Book`.
    pub kind: &'static str,
    /// Attribute descriptors, in declaration order.
    pub attributes: &'static [Attribute],
}

impl Schema {
    /// Decodes every attribute of this schema from `element`.
    pub fn decode(&self, element: &Element) -> Result<Fields, MappingError> {
        trace!(kind = self.kind, element = element.name(), "Decoding record");
        let mut values = HashMap::with_capacity(self.attributes.len());
        for attr in self.attributes {
            values.insert(attr.name, attr.decode(self, element)?);
        }
        Ok(Fields { kind: self.kind, values })
    }

    /// Looks up a descriptor by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

// ============================================================================
// Decoded values
// ============================================================================

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value (nullable attribute with nothing to decode).
    Null,
    /// Text.
    Text(String),
    /// Integer.
    Integer(i64),
    /// Float.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// Timestamp.
    Timestamp(DateTime<FixedOffset>),
    /// URL.
    Uri(Url),
    /// Nested record fields.
    Record(Fields),
    /// Nested records in document order.
    List(Vec<Fields>),
}

/// Decoded values of one record, keyed by attribute name.
///
/// The `take_*` accessors move values out so a record can be assembled in a
/// single constructor call.
#[derive(Debug, Clone, PartialEq)]
pub struct Fields {
    kind: &'static str,
    values: HashMap<&'static str, Value>,
}

macro_rules! take_value {
    ($required:ident, $optional:ident, $variant:ident, $ty:ty, $label:literal) => {
        #[doc = concat!("Takes a required ", $label, " value.")]
        pub fn $required(&mut self, name: &'static str) -> Result<$ty, MappingError> {
            self.$optional(name)?
                .ok_or_else(|| self.mismatch(name, $label))
        }

        #[doc = concat!("Takes a nullable ", $label, " value.")]
        pub fn $optional(&mut self, name: &'static str) -> Result<Option<$ty>, MappingError> {
            match self.values.remove(name) {
                Some(Value::$variant(v)) => Ok(Some(v)),
                Some(Value::Null) | None => Ok(None),
                Some(_) => Err(self.mismatch(name, $label)),
            }
        }
    };
}

impl Fields {
    /// Record kind these fields belong to.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Borrows a value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn mismatch(&self, name: &'static str, expected: &'static str) -> MappingError {
        MappingError::FieldType {
            kind: self.kind,
            attribute: name,
            expected,
        }
    }

    take_value!(text, text_opt, Text, String, "text");
    take_value!(integer, integer_opt, Integer, i64, "integer");
    take_value!(float, float_opt, Float, f64, "float");
    take_value!(boolean, boolean_opt, Boolean, bool, "boolean");
    take_value!(timestamp, timestamp_opt, Timestamp, DateTime<FixedOffset>, "timestamp");
    take_value!(uri, uri_opt, Uri, Url, "uri");

    /// Takes a nested record and builds it.
    pub fn record<R: Record>(&mut self, name: &'static str) -> Result<R, MappingError> {
        match self.values.remove(name) {
            Some(Value::Record(fields)) => R::from_fields(fields),
            _ => Err(self.mismatch(name, "record")),
        }
    }

    /// Takes a list of nested records and builds each one, keeping order.
    pub fn list<R: Record>(&mut self, name: &'static str) -> Result<Vec<R>, MappingError> {
        match self.values.remove(name) {
            Some(Value::List(items)) => items.into_iter().map(R::from_fields).collect(),
            _ => Err(self.mismatch(name, "list")),
        }
    }
}

// ============================================================================
// Record trait
// ============================================================================

/// A record kind that can be decoded from XML through its schema.
pub trait Record: Sized {
    /// The descriptor set for this kind.
    fn schema() -> &'static Schema;

    /// Builds the record from decoded fields.
    fn from_fields(fields: Fields) -> Result<Self, MappingError>;

    /// Decodes the record from an element.
    fn from_element(element: &Element) -> Result<Self, MappingError> {
        Self::from_fields(Self::schema().decode(element)?)
    }

    /// Parses a document whose root element is this record.
    fn from_xml(xml: &str) -> Result<Self, MappingError> {
        Self::from_element(&Element::parse(xml)?)
    }
}
