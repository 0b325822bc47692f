//! Builds a [`Node`] tree from html5gum's token stream and locates a
//! template's root node.

use html5gum::emitters::callback::{CallbackEmitter, CallbackEvent};
use html5gum::{Span, Tokenizer};

use crate::error::DomError;
use crate::serialize::{escape_text, is_raw_text_element, normalize_markup};
use crate::{Element, Node};

/// HTML void elements that cannot have children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub(crate) fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// Parsed markup. html5gum is a tokenizer only, so no implied
/// `<html>`/`<body>` wrappers are created: top-level nodes are exactly
/// what the source contains.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub children: Vec<Node>,
}

pub fn parse_document(html: &str) -> Result<Document, DomError> {
    if html.trim().is_empty() {
        return Err(DomError::EmptyDocument);
    }
    build_tree(html).map(|children| Document { children })
}

pub fn parse_document_bytes(html: &[u8]) -> Result<Document, DomError> {
    let html = std::str::from_utf8(html).map_err(|_| DomError::InvalidUtf8)?;
    parse_document(html)
}

/// Parses markup that is spliced into an existing tree (`v-html`).
/// A full `<html><body>` document contributes only its body's children.
pub fn parse_fragment(html: &str) -> Result<Vec<Node>, DomError> {
    let doc = Document {
        children: build_tree(html)?,
    };
    let Some(html_el) = doc.html_element() else {
        return Ok(doc.children);
    };
    let body = html_el
        .children
        .iter()
        .filter_map(Node::as_element)
        .find(|el| el.tag == "body")
        .unwrap_or(html_el);
    Ok(body.children.clone())
}

fn attach(stack: &mut [Element], node: Node, roots: &mut Vec<Node>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn push_text(stack: &mut [Element], text: &str, roots: &mut Vec<Node>) {
    if text.is_empty() {
        return;
    }
    let siblings = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => roots,
    };
    match siblings.last_mut() {
        Some(Node::Text(prev)) => prev.push_str(text),
        _ => siblings.push(Node::Text(text.to_string())),
    }
}

/// Owned copy of one tokenizer callback. Attributes arrive one by one, in
/// source order.
enum Event {
    Open(String),
    AttrName(String),
    AttrValue(String),
    Close { self_closing: bool },
    End(String),
    Text { source: Option<String>, decoded: String },
    Comment(String),
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// The source slice behind a text token in markup form, when its span lines
/// up with the decoded text.
fn source_slice(input: &str, span: Span<usize>, decoded: &[u8]) -> Option<String> {
    let raw = input.get(span.start..span.end)?;
    (raw.as_bytes() == decoded || raw.contains('&')).then(|| normalize_markup(raw))
}

fn build_tree(input: &str) -> Result<Vec<Node>, DomError> {
    let mut emitter = CallbackEmitter::new(
        move |event: CallbackEvent<'_>, span: Span<usize>| -> Option<Event> {
            Some(match event {
                CallbackEvent::OpenStartTag { name } => {
                    Event::Open(lossy(name).to_ascii_lowercase())
                }
                CallbackEvent::AttributeName { name } => Event::AttrName(lossy(name)),
                CallbackEvent::AttributeValue { value } => Event::AttrValue(lossy(value)),
                CallbackEvent::CloseStartTag { self_closing } => Event::Close { self_closing },
                CallbackEvent::EndTag { name } => Event::End(lossy(name).to_ascii_lowercase()),
                CallbackEvent::String { value } => Event::Text {
                    source: source_slice(input, span, value),
                    decoded: lossy(value),
                },
                CallbackEvent::Comment { value } => Event::Comment(lossy(value)),
                CallbackEvent::Doctype { .. } => return None,
                CallbackEvent::Error(err) => {
                    tracing::debug!(error = ?err, "recoverable markup error");
                    return None;
                }
            })
        },
    );
    // script, style, textarea and title switch to their raw-text states
    emitter.naively_switch_states(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut roots: Vec<Node> = Vec::new();
    let mut open: Option<Element> = None;
    let mut pending_attr: Option<String> = None;

    for event in Tokenizer::new_with_emitter(input, emitter) {
        let Ok(event) = event;
        match event {
            Event::Open(tag) => {
                open = Some(Element::new(tag));
                pending_attr = None;
            }
            Event::AttrName(name) => {
                // Attributes outside a start tag and repeated names are dropped.
                pending_attr = None;
                if let Some(el) = open.as_mut().filter(|el| !el.attrs.contains(&name)) {
                    el.attrs.set(name.clone(), "");
                    pending_attr = Some(name);
                }
            }
            Event::AttrValue(value) => {
                if let (Some(el), Some(name)) = (open.as_mut(), pending_attr.take()) {
                    el.attrs.set(name, value);
                }
            }
            Event::Close { self_closing } => {
                pending_attr = None;
                if let Some(el) = open.take() {
                    if self_closing || el.is_void() {
                        attach(&mut stack, Node::Element(el), &mut roots);
                    } else {
                        stack.push(el);
                    }
                }
            }
            Event::End(end_name) => {
                // Stray end tags are dropped.
                if let Some(idx) = stack.iter().rposition(|el| el.tag == end_name) {
                    while stack.len() > idx {
                        if let Some(el) = stack.pop() {
                            attach(&mut stack, Node::Element(el), &mut roots);
                        }
                    }
                }
            }
            Event::Text { source, decoded } => {
                let raw_parent = stack
                    .last()
                    .is_some_and(|el| is_raw_text_element(&el.tag));
                let text = match source {
                    _ if raw_parent => decoded,
                    Some(source) => source,
                    None => escape_text(&decoded),
                };
                push_text(&mut stack, &text, &mut roots);
            }
            Event::Comment(text) => attach(&mut stack, Node::Comment(text), &mut roots),
        }
    }

    while let Some(el) = stack.pop() {
        attach(&mut stack, Node::Element(el), &mut roots);
    }
    Ok(roots)
}

fn substantial(nodes: &[Node]) -> impl Iterator<Item = &Node> {
    nodes.iter().filter(|n| n.is_substantial())
}

/// The `<template>` of a single-file component: the only `<template>`
/// among top-level nodes that are otherwise `<script>`, `<style>`,
/// comments or whitespace.
fn sfc_template(nodes: &[Node]) -> Option<&Element> {
    let mut template = None;
    for node in substantial(nodes) {
        let el = node.as_element()?;
        match el.tag.as_str() {
            "template" if template.is_none() => template = Some(el),
            "script" | "style" => {}
            _ => return None,
        }
    }
    template
}

fn only_substantial_child(nodes: &[Node]) -> Result<&Node, DomError> {
    let mut found = substantial(nodes);
    let first = found.next().ok_or(DomError::NoRootNode)?;
    let extra = found.count();
    if extra > 0 {
        return Err(DomError::MultipleRootNodes { count: extra + 1 });
    }
    Ok(first)
}

impl Document {
    pub fn html_element(&self) -> Option<&Element> {
        let mut top = substantial(&self.children);
        let el = top.next()?.as_element()?;
        (el.tag == "html" && top.next().is_none()).then_some(el)
    }

    pub fn body_element(&self) -> Option<&Element> {
        self.html_element()?
            .children
            .iter()
            .filter_map(Node::as_element)
            .find(|el| el.tag == "body")
    }

    /// The node a template renders from.
    ///
    /// An explicit `<html>` wrapper must hold exactly one `<head>` or
    /// `<body>`. Inside that scope a single-file component's
    /// `<template>` is unwrapped, and what remains must contain exactly
    /// one substantial node.
    pub fn root_node(&self) -> Result<&Node, DomError> {
        if self.children.is_empty() {
            return Err(DomError::EmptyDocument);
        }

        let mut scope: &[Node] = &self.children;
        if let Some(html) = self.html_element() {
            let section = only_substantial_child(&html.children)?;
            match section.as_element() {
                Some(el) if el.tag == "head" || el.tag == "body" => scope = &el.children,
                Some(el) => {
                    return Err(DomError::UnexpectedElement {
                        expected: "body",
                        found: el.tag.clone(),
                    });
                }
                None => {
                    return Err(DomError::UnexpectedElement {
                        expected: "body",
                        found: "#text".to_string(),
                    });
                }
            }
        }

        if let Some(template) = sfc_template(scope) {
            scope = &template.children;
        }
        only_substantial_child(scope)
    }
}
