//! Naming conventions of the template syntax.

use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Element,
    /// Custom element rendered through the component registry.
    Component,
}

pub fn classify_tag(tag: &str) -> TagKind {
    if tag.contains('-') {
        TagKind::Component
    } else {
        TagKind::Element
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    If,
    ElseIf,
    Else,
    For,
    Html,
}

impl Directive {
    pub const fn attribute(self) -> &'static str {
        match self {
            Directive::If => "v-if",
            Directive::ElseIf => "v-else-if",
            Directive::Else => "v-else",
            Directive::For => "v-for",
            Directive::Html => "v-html",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind<'a> {
    Literal,
    /// `:target` or `v-bind:target`.
    Binding { target: &'a str },
    /// `@event` or `v-on:event`, with any modifiers.
    Event { event: &'a str },
    Directive(Directive),
}

pub fn classify_attr(name: &str) -> AttrKind<'_> {
    if let Some(target) = name.strip_prefix(':').or_else(|| name.strip_prefix("v-bind:")) {
        return AttrKind::Binding { target };
    }
    if let Some(event) = name.strip_prefix('@').or_else(|| name.strip_prefix("v-on:")) {
        return AttrKind::Event { event };
    }
    match name {
        "v-if" => AttrKind::Directive(Directive::If),
        "v-else-if" => AttrKind::Directive(Directive::ElseIf),
        "v-else" => AttrKind::Directive(Directive::Else),
        "v-for" => AttrKind::Directive(Directive::For),
        "v-html" => AttrKind::Directive(Directive::Html),
        _ => AttrKind::Literal,
    }
}

/// `some-long-prop` → `someLongProp`.
pub fn kebab_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Parsed `v-for` value: `item in list`, `item of list` or
/// `(item, index) in list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSpec {
    pub item: String,
    pub index: Option<String>,
    pub source: String,
}

pub fn parse_loop(directive: &str) -> Result<LoopSpec, RenderError> {
    let invalid = || RenderError::InvalidLoop {
        directive: directive.to_string(),
    };
    let (lhs, source) = directive
        .split_once(" in ")
        .or_else(|| directive.split_once(" of "))
        .ok_or_else(invalid)?;
    let source = source.trim();
    let lhs = lhs.trim();
    let lhs = lhs
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(lhs);

    let mut names = lhs.split(',').map(str::trim);
    let item = names.next().filter(|n| is_identifier(n)).ok_or_else(invalid)?;
    let index = match names.next() {
        Some(n) if is_identifier(n) => Some(n.to_string()),
        Some(_) => return Err(invalid()),
        None => None,
    };
    if names.next().is_some() || source.is_empty() {
        return Err(invalid());
    }
    Ok(LoopSpec {
        item: item.to_string(),
        index,
        source: source.to_string(),
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
