//! Owned markup tree for SVG text fragments.
//!
//! Text is modelled the way `text`/`tail` pairs work in element-tree APIs:
//! an element's `text` is the character data before its first child, and a
//! child's `tail` is the character data between that child's end tag and the
//! next sibling (or the parent's end tag).
//!
//! ```text
//! <text>head<tspan>run</tspan>after</text>
//!       ^^^^       ^^^       ^^^^^
//!  text.text  tspan.text  tspan.tail
//! ```
//!
//! Parsing is namespace-agnostic: prefixed names such as `krita:textVersion`
//! are kept verbatim, since host applications routinely emit fragments that
//! use prefixes declared on an enclosing document.

mod reader;
mod writer;

use thiserror::Error;

pub use reader::parse_fragment;

/// Errors raised while reading or writing markup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkupError {
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("fragment has no root element")]
    Empty,

    #[error("content after the root element: {0:?}")]
    TrailingContent(String),

    #[error("failed to write markup: {0}")]
    Write(String),
}

pub type Result<T> = std::result::Result<T, MarkupError>;

/// A markup element with ordered attributes and element-tree text slots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Name without any namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Whether this element's local name is `local`.
    #[must_use]
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(idx).1)
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append character data after this element, extending any existing tail.
    pub fn append_tail(&mut self, text: &str) {
        self.tail.get_or_insert_with(String::new).push_str(text);
    }

    /// Append character data inside this element, after its current last child.
    pub fn append_text(&mut self, text: &str) {
        match self.children.last_mut() {
            Some(last) => last.append_tail(text),
            None => self.text.get_or_insert_with(String::new).push_str(text),
        }
    }

    /// Direct children whose local name is `local`.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.is(local))
    }

    /// Rebuild this subtree without the named attributes at any depth.
    ///
    /// Every other attribute, text and tail is carried over into fresh nodes.
    #[must_use]
    pub fn without_attributes(&self, names: &[&str]) -> Element {
        Element {
            name: self.name.clone(),
            attributes: self
                .attributes
                .iter()
                .filter(|(k, _)| !names.contains(&k.as_str()))
                .cloned()
                .collect(),
            text: self.text.clone(),
            tail: self.tail.clone(),
            children: self
                .children
                .iter()
                .map(|c| c.without_attributes(names))
                .collect(),
        }
    }

    /// Serialize this element and its subtree.
    ///
    /// The element's own tail is not written: it belongs to the parent's
    /// content stream.
    pub fn to_markup(&self) -> Result<String> {
        writer::write_fragment(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str) -> Element {
        Element::new("tspan").with_text(text)
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut el = Element::new("text");
        el.set_attr("x", "1");
        el.set_attr("y", "2");
        el.set_attr("x", "3");
        let attrs: Vec<_> = el.attributes().collect();
        assert_eq!(attrs, vec![("x", "3"), ("y", "2")]);
    }

    #[test]
    fn remove_attr_returns_value() {
        let mut el = Element::new("text");
        el.set_attr("transform", "matrix(1 0 0 1 0 0)");
        assert_eq!(el.remove_attr("transform").as_deref(), Some("matrix(1 0 0 1 0 0)"));
        assert!(el.attr("transform").is_none());
        assert!(el.remove_attr("transform").is_none());
    }

    #[test]
    fn append_text_goes_to_last_child_tail() {
        let mut el = Element::new("text");
        el.append_text("a");
        el.children.push(span("b"));
        el.append_text("c");
        el.append_text("d");
        assert_eq!(el.text.as_deref(), Some("a"));
        assert_eq!(el.children[0].tail.as_deref(), Some("cd"));
    }

    #[test]
    fn local_name_ignores_prefix() {
        let el = Element::new("svg:tspan");
        assert_eq!(el.local_name(), "tspan");
        assert!(el.is("tspan"));
        assert!(!Element::new("text").is("tspan"));
    }

    #[test]
    fn without_attributes_is_deep_and_leaves_source_alone() {
        let mut inner = span("inner");
        inner.set_attr("dy", "3");
        inner.set_attr("fill", "red");
        inner.tail = Some("tail".into());
        let mut outer = span("outer");
        outer.set_attr("x", "0");
        outer.set_attr("style", "font-weight:bold");
        outer.children.push(inner);

        let cleaned = outer.without_attributes(&["x", "y", "dy"]);
        assert!(cleaned.attr("x").is_none());
        assert_eq!(cleaned.attr("style"), Some("font-weight:bold"));
        assert!(cleaned.children[0].attr("dy").is_none());
        assert_eq!(cleaned.children[0].attr("fill"), Some("red"));
        assert_eq!(cleaned.children[0].tail.as_deref(), Some("tail"));

        assert_eq!(outer.attr("x"), Some("0"));
        assert_eq!(outer.children[0].attr("dy"), Some("3"));
    }
}
