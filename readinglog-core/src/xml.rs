//! Owned XML element tree.
//!
//! The API responses are small (one page of reviews), so the whole document is
//! read into a tree once and the mapping engine walks it with relative paths:
//!
//! - `title` - first child element named `title`
//! - `authors/author` - `author` children of the `authors` child
//! - `@name` - the XML attribute `name` of the current element

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::MappingError;

/// An element with its attributes, text content, and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

/// A node matched by a path: an element or an attribute value.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// A matched element.
    Element(&'a Element),
    /// A matched XML attribute value.
    Attribute(&'a str),
}

impl<'a> Node<'a> {
    /// Returns the text of the node (element text or attribute value).
    pub fn text(&self) -> &'a str {
        match self {
            Node::Element(el) => el.text(),
            Node::Attribute(value) => value,
        }
    }

    /// Returns the element, if this node is one.
    pub fn as_element(&self) -> Option<&'a Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Attribute(_) => None,
        }
    }
}

impl Element {
    /// Creates an empty element with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parses a document and returns its root element.
    pub fn parse(xml: &str) -> Result<Element, MappingError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    stack.push(Self::from_start(&start)?);
                }
                Event::Empty(start) => {
                    let el = Self::from_start(&start)?;
                    Self::attach(&mut stack, &mut root, el)?;
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| MappingError::Xml("unbalanced end tag".to_string()))?;
                    Self::attach(&mut stack, &mut root, el)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(MappingError::Xml("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| MappingError::Xml("document has no root element".to_string()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Element, MappingError> {
        let mut el = Element::new(String::from_utf8_lossy(start.local_name().as_ref()));
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            el.attributes.push((key, value));
        }
        Ok(el)
    }

    fn attach(
        stack: &mut [Element],
        root: &mut Option<Element>,
        el: Element,
    ) -> Result<(), MappingError> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(el),
            None if root.is_none() => *root = Some(el),
            None => return Err(MappingError::Xml("multiple root elements".to_string())),
        }
        Ok(())
    }

    /// Element name (without namespace prefix).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text content directly inside this element, untrimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Value of an XML attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns every node matching a relative path, in document order.
    pub fn select<'a>(&'a self, path: &str) -> Vec<Node<'a>> {
        let mut current: Vec<&'a Element> = vec![self];
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();

        while let Some(segment) = segments.next() {
            if let Some(attr) = segment.strip_prefix('@') {
                if segments.peek().is_some() {
                    return Vec::new();
                }
                return current
                    .into_iter()
                    .filter_map(|el| el.attribute(attr))
                    .map(Node::Attribute)
                    .collect();
            }
            current = current
                .into_iter()
                .flat_map(|el| el.children.iter().filter(|c| c.name == segment))
                .collect();
        }

        current.into_iter().map(Node::Element).collect()
    }

    /// Returns the first node matching a relative path.
    pub fn select_first<'a>(&'a self, path: &str) -> Option<Node<'a>> {
        self.select(path).into_iter().next()
    }

    /// Finds the first element with the given name anywhere below this one
    /// (this element included), depth-first in document order.
    pub fn descendant(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.descendant(name))
    }
}
