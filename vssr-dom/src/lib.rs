//! Render tree for server-side template rendering: nodes, HTML parsing
//! and serialization.

pub mod error;
pub mod parse;
pub mod serialize;

pub use error::DomError;
pub use parse::{Document, parse_document, parse_document_bytes, parse_fragment};
pub use serialize::{escape_text, serialize, serialize_nodes, unescape_text};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Character data in its serialized form: character references stay
    /// as they were written. Use [`escape_text`] for plain strings.
    Text(String),
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Comments and whitespace-only text do not count as content when
    /// looking for a template's root.
    pub fn is_substantial(&self) -> bool {
        match self {
            Node::Element(_) => true,
            Node::Text(t) => !t.trim().is_empty(),
            Node::Comment(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Attributes,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn is_void(&self) -> bool {
        parse::is_void_element(&self.tag)
    }
}

/// Attributes in document order. Names are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Updates an existing attribute in place or appends a new one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    /// Swaps `old` for `name=value`. If `name` is already present it is
    /// updated where it stands and `old` is dropped; otherwise the new
    /// attribute takes `old`'s slot.
    pub fn replace(&mut self, old: &str, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if self.contains(&name) || !self.contains(old) {
            self.remove(old);
            self.set(name, value);
        } else if let Some(i) = self.position(old) {
            self.entries[i] = (name, value.into());
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.entries.retain(|(k, v)| keep(k, v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == name)
    }
}

impl From<()> for Attributes {
    fn from(_: ()) -> Self {
        Attributes::default()
    }
}

impl From<Vec<(&str, &str)>> for Attributes {
    fn from(v: Vec<(&str, &str)>) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in v {
            attrs.set(k, v);
        }
        attrs
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            if !attrs.contains(&k) {
                attrs.entries.push((k, v));
            }
        }
        attrs
    }
}

pub fn h(tag: impl Into<String>, attrs: impl Into<Attributes>, children: Vec<Node>) -> Node {
    Node::Element(Element {
        tag: tag.into(),
        attrs: attrs.into(),
        children,
    })
}

/// Text node from markup; see [`Node::Text`].
pub fn text(t: impl Into<String>) -> Node {
    Node::Text(t.into())
}

pub fn comment(t: impl Into<String>) -> Node {
    Node::Comment(t.into())
}
