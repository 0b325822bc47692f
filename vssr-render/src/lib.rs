//! Server-side rendering of Vue-style templates.
//!
//! [`render`] handles a single template. [`App`] holds named component
//! templates so that custom tags (`<x-item :prop="expr">`) can be
//! rendered recursively.

pub mod app;
pub mod classify;
mod engine;
pub mod error;

pub use app::{App, RenderOptions, Setup, Template};
pub use classify::{AttrKind, Directive, TagKind, classify_attr, classify_tag, kebab_to_camel};
pub use error::RenderError;
pub use vssr_expr::{Map, Methods, Value};

const ROOT_COMPONENT: &str = "root";

/// Renders `template` against `data`, with `methods` callable from
/// expressions and filters.
pub fn render(template: &str, data: Map<String, Value>, methods: &Methods) -> Result<String, RenderError> {
    let mut app = App::new(methods.clone());
    app.register_template(ROOT_COMPONENT, template);
    app.render_component(ROOT_COMPONENT, data)
}
