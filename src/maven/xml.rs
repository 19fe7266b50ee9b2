//! Minimal XML element tree used to edit build descriptors in place.
//!
//! Whitespace-only text is dropped on read and the tree is re-indented with
//! four spaces on write. Comments and element order are preserved.

use std::fmt::Display;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::MigrationError;

/// A node of the element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An XML element with attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// An element holding a single text node.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.children.push(Node::Text(text.into()));
        element
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First text content of the element, if any.
    pub fn text(&self) -> Option<&str> {
        self.children.iter().find_map(|node| match node {
            Node::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Replace all text content with `text`.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|node| !matches!(node, Node::Text(_)));
        self.children.push(Node::Text(text.into()));
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// Text of the first child named `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Element::text)
    }

    /// Set the text of child `name`, creating the child when missing.
    pub fn set_child_text(&mut self, name: &str, text: impl Into<String>) {
        self.ensure_child(name).set_text(text);
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> {
        self.elements_mut().filter(move |e| e.name == name)
    }

    /// Follow a path of child names from this element.
    pub fn path(&self, path: &[&str]) -> Option<&Element> {
        let mut current = self;
        for name in path {
            current = current.child(name)?;
        }
        Some(current)
    }

    pub fn path_mut(&mut self, path: &[&str]) -> Option<&mut Element> {
        let mut current = self;
        for name in path {
            current = current.child_mut(name)?;
        }
        Some(current)
    }

    /// Return child `name`, appending an empty one when missing.
    pub fn ensure_child(&mut self, name: &str) -> &mut Element {
        let index = match self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.name == name))
        {
            Some(index) => index,
            None => {
                self.children.push(Node::Element(Element::new(name)));
                self.children.len() - 1
            }
        };
        match &mut self.children[index] {
            Node::Element(e) => e,
            _ => unreachable!("index points at an element"),
        }
    }

    /// Like [`Element::ensure_child`] along a whole path.
    pub fn ensure_path(&mut self, path: &[&str]) -> &mut Element {
        let mut current = self;
        for name in path {
            current = current.ensure_child(name);
        }
        current
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Remove child elements matching `predicate`; returns how many were removed.
    pub fn remove_elements<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Element) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|node| match node {
            Node::Element(e) => !predicate(e),
            _ => true,
        });
        before - self.children.len()
    }

    fn from_start(start: &BytesStart<'_>, origin: &str) -> Result<Self, MigrationError> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| xml_error(origin, e))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| xml_error(origin, e))?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>, origin: &str) -> Result<(), MigrationError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.children.is_empty() {
            return write_event(writer, Event::Empty(start), origin);
        }
        write_event(writer, Event::Start(start), origin)?;
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_to(writer, origin)?,
                Node::Text(text) => write_event(writer, Event::Text(BytesText::new(text)), origin)?,
                Node::Comment(text) => write_event(
                    writer,
                    Event::Comment(BytesText::from_escaped(text.as_str())),
                    origin,
                )?,
            }
        }
        write_event(writer, Event::End(BytesEnd::new(self.name.as_str())), origin)
    }
}

/// A parsed XML document; only the root element is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: Element,
}

impl XmlDocument {
    /// Parse `input`; `origin` names the source in error messages.
    pub fn parse(input: &str, origin: &str) -> Result<Self, MigrationError> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event().map_err(|e| xml_error(origin, e))? {
                Event::Start(start) => stack.push(Element::from_start(&start, origin)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&start, origin)?;
                    attach(&mut stack, &mut root, element, origin)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| xml_error(origin, "unexpected closing tag"))?;
                    attach(&mut stack, &mut root, element, origin)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| xml_error(origin, e))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.children.push(Node::Text(text));
                    }
                }
                Event::Comment(comment) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&comment).into_owned();
                        parent.children.push(Node::Comment(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(xml_error(origin, "unclosed element"));
        }
        root.map(|root| Self { root })
            .ok_or_else(|| xml_error(origin, "document has no root element"))
    }

    pub fn read(path: &Path) -> Result<Self, MigrationError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Serialize with an XML declaration and four-space indentation.
    pub fn to_xml_string(&self) -> Result<String, MigrationError> {
        let origin = self.root.name.as_str();
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
            origin,
        )?;
        self.root.write_to(&mut writer, origin)?;
        let mut output = String::from_utf8(writer.into_inner())
            .map_err(|e| xml_error(origin, e))?;
        output.push('\n');
        Ok(output)
    }

    pub fn write(&self, path: &Path) -> Result<(), MigrationError> {
        fs::write(path, self.to_xml_string()?)?;
        Ok(())
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    origin: &str,
) -> Result<(), MigrationError> {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(xml_error(origin, "multiple root elements")),
    }
    Ok(())
}

fn write_event(
    writer: &mut Writer<Vec<u8>>,
    event: Event<'_>,
    origin: &str,
) -> Result<(), MigrationError> {
    writer.write_event(event).map_err(|e| xml_error(origin, e))
}

fn xml_error(origin: &str, error: impl Display) -> MigrationError {
    MigrationError::Xml {
        path: origin.to_string(),
        message: error.to_string(),
    }
}
