//! Directive engine: a single pre-order pass over an owned render tree.
//!
//! Per element, in order: event handlers are stripped, `v-for` expands
//! the element, `v-html` replaces its children, component tags are
//! dispatched to the registry, bound attributes are evaluated, and the
//! children are rendered as a sibling list (where `v-if` chains are
//! resolved before anything else).

use serde_json::{Map, Value};
use vssr_dom::{Element, Node, escape_text, parse_fragment, unescape_text};
use vssr_expr::Context;
use vssr_expr::value::{is_truthy, to_display_string, type_name};

use crate::app::App;
use crate::classify::{
    AttrKind, Directive, TagKind, classify_attr, classify_tag, kebab_to_camel, parse_loop,
};
use crate::error::RenderError;

/// Where a sibling list stands in an `v-if` / `v-else-if` / `v-else` chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    AwaitingIf,
    Matched,
    Unmatched,
}

/// Outcome of the per-element steps that may take the element out of the
/// normal flow.
enum Visit {
    Replaced(Vec<Node>),
    Continue(Element),
}

pub(crate) struct Engine<'a> {
    app: &'a App,
    depth: usize,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(app: &'a App, depth: usize) -> Self {
        Self { app, depth }
    }

    pub(crate) fn render_root(&self, root: Node, ctx: &Context<'_>) -> Result<Vec<Node>, RenderError> {
        self.render_list(vec![root], ctx)
    }

    fn evaluate(&self, source: &str, ctx: &Context<'_>) -> Result<Value, RenderError> {
        let expr = self.app.parse_expression(source)?;
        expr.evaluate(ctx).map_err(|source_err| RenderError::Eval {
            expression: source.trim().to_string(),
            source: source_err,
        })
    }

    fn render_list(&self, mut nodes: Vec<Node>, ctx: &Context<'_>) -> Result<Vec<Node>, RenderError> {
        let removed = self.resolve_conditionals(&mut nodes, ctx)?;
        let mut out = Vec::with_capacity(nodes.len());
        for (node, removed) in nodes.into_iter().zip(removed) {
            if !removed {
                out.extend(self.render_node(node, ctx)?);
            }
        }
        Ok(out)
    }

    /// Strips conditional directives and marks the siblings whose branch
    /// did not win. Text and comments between branches are skipped.
    fn resolve_conditionals(
        &self,
        nodes: &mut [Node],
        ctx: &Context<'_>,
    ) -> Result<Vec<bool>, RenderError> {
        let mut removed = vec![false; nodes.len()];
        let mut state = ChainState::AwaitingIf;

        for (i, node) in nodes.iter_mut().enumerate() {
            let Some(el) = node.as_element_mut() else {
                continue;
            };

            if let Some(condition) = el.attrs.remove(Directive::If.attribute()) {
                let matched = is_truthy(&self.evaluate(&condition, ctx)?);
                removed[i] = !matched;
                state = if matched {
                    ChainState::Matched
                } else {
                    ChainState::Unmatched
                };
            } else if let Some(condition) = el.attrs.remove(Directive::ElseIf.attribute()) {
                match state {
                    ChainState::Matched => removed[i] = true,
                    ChainState::Unmatched => {
                        let matched = is_truthy(&self.evaluate(&condition, ctx)?);
                        removed[i] = !matched;
                        if matched {
                            state = ChainState::Matched;
                        }
                    }
                    ChainState::AwaitingIf => {
                        tracing::warn!(tag = %el.tag, "v-else-if without a preceding v-if");
                    }
                }
            } else if el.attrs.remove(Directive::Else.attribute()).is_some() {
                match state {
                    ChainState::Matched => removed[i] = true,
                    ChainState::Unmatched => {}
                    ChainState::AwaitingIf => {
                        tracing::warn!(tag = %el.tag, "v-else without a preceding v-if");
                    }
                }
            }
        }
        Ok(removed)
    }

    fn render_node(&self, node: Node, ctx: &Context<'_>) -> Result<Vec<Node>, RenderError> {
        match node {
            Node::Text(text) => Ok(vec![Node::Text(self.interpolate(&text, ctx)?)]),
            Node::Comment(_) => Ok(vec![node]),
            Node::Element(mut el) => {
                el.attrs
                    .retain(|name, _| !matches!(classify_attr(name), AttrKind::Event { .. }));

                match el.attrs.remove(Directive::For.attribute()) {
                    Some(directive) => self.expand_loop(el, &directive, ctx),
                    None => self.render_element(el, ctx),
                }
            }
        }
    }

    /// Replaces every `{{ expression }}` with the escaped display form of
    /// its value.
    fn interpolate(&self, text: &str, ctx: &Context<'_>) -> Result<String, RenderError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                break;
            };
            out.push_str(&rest[..open]);
            let value = self.evaluate(&unescape_text(&after[..close]), ctx)?;
            out.push_str(&escape_text(&to_display_string(&value)));
            rest = &after[close + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn expand_loop(
        &self,
        mut el: Element,
        directive: &str,
        ctx: &Context<'_>,
    ) -> Result<Vec<Node>, RenderError> {
        let looped = parse_loop(directive)?;
        for key in [":key", "v-bind:key"] {
            el.attrs.remove(key);
        }

        let entries: Vec<(Value, Value)> = match self.evaluate(&looped.source, ctx)? {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (item, Value::from(i)))
                .collect(),
            Value::Object(map) => map.into_iter().map(|(k, v)| (v, Value::String(k))).collect(),
            other => {
                return Err(RenderError::NotIterable {
                    expression: looped.source,
                    found: type_name(&other),
                });
            }
        };
        tracing::debug!(tag = %el.tag, items = entries.len(), "expanding v-for");

        let mut out = Vec::new();
        for (item, index) in entries {
            let mut scope = Map::new();
            scope.insert(looped.item.clone(), item);
            if let Some(index_name) = &looped.index {
                scope.insert(index_name.clone(), index);
            }
            let item_ctx = ctx.extend_with(scope);
            out.extend(self.render_element(el.clone(), &item_ctx)?);
        }
        Ok(out)
    }

    fn render_element(&self, el: Element, ctx: &Context<'_>) -> Result<Vec<Node>, RenderError> {
        let raw_children = el.attrs.contains(Directive::Html.attribute());
        let el = if raw_children {
            self.inject_html(el, ctx)?
        } else {
            el
        };

        let mut el = match self.dispatch_component(el, ctx)? {
            Visit::Replaced(nodes) => return Ok(nodes),
            Visit::Continue(el) => el,
        };

        self.bind_attributes(&mut el, ctx)?;

        if !raw_children {
            let children = std::mem::take(&mut el.children);
            el.children = self.render_list(children, ctx)?;
        }

        if el.tag == "template" {
            Ok(el.children)
        } else {
            Ok(vec![Node::Element(el)])
        }
    }

    /// `v-html`: the evaluated string is parsed and becomes the element's
    /// children verbatim. This is the only place where data is inserted
    /// as markup, so callers must trust it.
    fn inject_html(&self, mut el: Element, ctx: &Context<'_>) -> Result<Element, RenderError> {
        let Some(source) = el.attrs.remove(Directive::Html.attribute()) else {
            return Ok(el);
        };
        let html = to_display_string(&self.evaluate(&source, ctx)?);
        el.children = parse_fragment(&html)?;
        Ok(el)
    }

    fn dispatch_component(&self, el: Element, ctx: &Context<'_>) -> Result<Visit, RenderError> {
        if classify_tag(&el.tag) != TagKind::Component {
            return Ok(Visit::Continue(el));
        }

        let mut props = Map::new();
        for (name, value) in el.attrs.iter() {
            match classify_attr(name) {
                AttrKind::Literal => {
                    props.insert(kebab_to_camel(name), Value::String(value.to_string()));
                }
                AttrKind::Binding { target } => {
                    props.insert(kebab_to_camel(target), self.evaluate(value, ctx)?);
                }
                AttrKind::Event { .. } | AttrKind::Directive(_) => {}
            }
        }

        tracing::debug!(component = %el.tag, depth = self.depth + 1, "dispatching component");
        let nodes = self.app.render_fragment(&el.tag, props, self.depth + 1)?;
        Ok(Visit::Replaced(nodes))
    }

    fn bind_attributes(&self, el: &mut Element, ctx: &Context<'_>) -> Result<(), RenderError> {
        for name in el.attrs.names() {
            let AttrKind::Binding { target } = classify_attr(&name) else {
                continue;
            };
            let target = target.to_string();
            let source = el.attrs.get(&name).unwrap_or_default().to_string();
            let value = self.evaluate(&source, ctx)?;

            if target == "class" {
                let merged = merge_classes(el.attrs.get("class"), &value);
                if merged.is_empty() {
                    el.attrs.remove(&name);
                    el.attrs.remove("class");
                } else {
                    el.attrs.replace(&name, "class", merged);
                }
                continue;
            }

            match value {
                Value::Bool(true) => el.attrs.replace(&name, target, ""),
                Value::Bool(false) | Value::Null => {
                    el.attrs.remove(&name);
                }
                Value::Array(_) | Value::Object(_) => {
                    return Err(RenderError::ArrayBinding {
                        attribute: target,
                        expression: source.trim().to_string(),
                    });
                }
                scalar => el.attrs.replace(&name, target, to_display_string(&scalar)),
            }
        }
        Ok(())
    }
}

/// A list contributes its truthy entries and a string or number its display
/// form, both after the static classes. A map's truthy keys come first, then
/// the static classes. Booleans and `null` contribute nothing.
fn merge_classes(static_class: Option<&str>, bound: &Value) -> String {
    let statics = static_class.unwrap_or_default().split_whitespace();
    let dynamic: Vec<String> = match bound {
        Value::Array(items) => items
            .iter()
            .filter(|v| is_truthy(v))
            .map(to_display_string)
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| is_truthy(v))
            .map(|(k, _)| k.clone())
            .collect(),
        Value::Bool(_) | Value::Null => Vec::new(),
        scalar => vec![to_display_string(scalar)],
    };
    let bound_classes = dynamic.iter().flat_map(|c| c.split_whitespace());

    let ordered: Vec<&str> = if bound.is_object() {
        bound_classes.chain(statics).collect()
    } else {
        statics.chain(bound_classes).collect()
    };
    let mut classes: Vec<&str> = Vec::with_capacity(ordered.len());
    for class in ordered {
        if !classes.contains(&class) {
            classes.push(class);
        }
    }
    classes.join(" ")
}
