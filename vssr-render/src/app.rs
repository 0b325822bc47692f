use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use vssr_dom::{DomError, Node, parse_document, serialize_nodes};
use vssr_expr::{CachingExpressionParser, Context, Expression, ExpressionParser, Methods};

use crate::engine::Engine;
use crate::error::RenderError;

/// Transforms a component's props before each render of it.
pub type Setup = Arc<dyn Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync>;

type Loader = Box<dyn Fn() -> Result<String, String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Components nested deeper than this fail with
    /// [`RenderError::RecursionLimit`].
    pub max_component_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_component_depth: 64,
        }
    }
}

enum Source {
    Markup(String),
    Lazy(Loader),
}

/// A component template, either given up front or produced on first use.
///
/// The markup is parsed once and its root node kept; each render works on
/// a clone of it.
pub struct Template {
    source: Source,
    root: OnceCell<Node>,
}

impl Template {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            source: Source::Markup(markup.into()),
            root: OnceCell::new(),
        }
    }

    /// The supplier runs the first time the component is rendered.
    pub fn lazy<F>(supplier: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::try_lazy(move || Ok::<_, std::convert::Infallible>(supplier()))
    }

    /// Like [`Template::lazy`], for suppliers that can fail. A failed load
    /// is reported as [`RenderError::TemplateLoad`] and retried on the next
    /// render.
    pub fn try_lazy<F, E>(supplier: F) -> Self
    where
        F: Fn() -> Result<String, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self {
            source: Source::Lazy(Box::new(move || supplier().map_err(|e| e.to_string()))),
            root: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.root.get().is_some()
    }

    fn root(&self, name: &str) -> Result<&Node, RenderError> {
        self.root.get_or_try_init(|| {
            let markup = match &self.source {
                Source::Markup(markup) => markup.clone(),
                Source::Lazy(load) => {
                    tracing::debug!(component = name, "loading template");
                    load().map_err(|message| RenderError::TemplateLoad {
                        name: name.to_string(),
                        message,
                    })?
                }
            };
            let document = parse_document(&markup)?;
            Ok(document.root_node()?.clone())
        })
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            Source::Markup(_) => "markup",
            Source::Lazy(_) => "lazy",
        };
        f.debug_struct("Template")
            .field("source", &source)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl From<&str> for Template {
    fn from(markup: &str) -> Self {
        Template::new(markup)
    }
}

impl From<String> for Template {
    fn from(markup: String) -> Self {
        Template::new(markup)
    }
}

struct Component {
    template: Template,
    setup: Option<Setup>,
}

/// Component registry. Templates are registered up front; rendering only
/// needs `&self`, so one `App` can serve concurrent renders.
pub struct App {
    components: HashMap<String, Component>,
    methods: Methods,
    parser: CachingExpressionParser,
    options: RenderOptions,
}

impl App {
    pub fn new(methods: Methods) -> Self {
        Self {
            components: HashMap::new(),
            methods,
            parser: CachingExpressionParser::new(),
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn methods(&self) -> &Methods {
        &self.methods
    }

    pub fn register_template(&mut self, name: impl Into<String>, template: impl Into<Template>) {
        self.insert(name.into(), template.into(), None);
    }

    pub fn register_template_with_setup<F>(
        &mut self,
        name: impl Into<String>,
        template: impl Into<Template>,
        setup: F,
    ) where
        F: Fn(Map<String, Value>) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.insert(name.into(), template.into(), Some(Arc::new(setup)));
    }

    fn insert(&mut self, name: String, template: Template, setup: Option<Setup>) {
        tracing::debug!(component = %name, setup = setup.is_some(), "registering component");
        self.components.insert(name, Component { template, setup });
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn render_component(&self, name: &str, data: Map<String, Value>) -> Result<String, RenderError> {
        let nodes = self.render_fragment(name, data, 0)?;
        Ok(serialize_nodes(&nodes))
    }

    /// Renders a component to a single node.
    pub fn render_component_to_node(
        &self,
        name: &str,
        data: Map<String, Value>,
    ) -> Result<Node, RenderError> {
        let mut nodes = self.render_fragment(name, data, 0)?;
        match nodes.len() {
            1 => Ok(nodes.remove(0)),
            0 => Err(DomError::NoRootNode.into()),
            count => Err(DomError::MultipleRootNodes { count }.into()),
        }
    }

    /// Evaluates one expression against `data` with this app's methods.
    pub fn evaluate_expression(
        &self,
        expression: &str,
        data: Map<String, Value>,
    ) -> Result<Value, RenderError> {
        let ctx = Context::with_methods(data, &self.methods);
        self.parse_expression(expression)?
            .evaluate(&ctx)
            .map_err(|source| RenderError::Eval {
                expression: expression.trim().to_string(),
                source,
            })
    }

    pub(crate) fn parse_expression(&self, source: &str) -> Result<Arc<Expression>, RenderError> {
        Ok(self.parser.parse(source)?)
    }

    pub(crate) fn render_fragment(
        &self,
        name: &str,
        data: Map<String, Value>,
        depth: usize,
    ) -> Result<Vec<Node>, RenderError> {
        if depth > self.options.max_component_depth {
            return Err(RenderError::RecursionLimit {
                component: name.to_string(),
                limit: self.options.max_component_depth,
            });
        }
        let component = self
            .components
            .get(name)
            .ok_or_else(|| RenderError::UnknownComponent {
                name: name.to_string(),
            })?;

        let root = component.template.root(name)?.clone();
        let data = match &component.setup {
            Some(setup) => setup(data),
            None => data,
        };
        let ctx = Context::with_methods(data, &self.methods);
        Engine::new(self, depth).render_root(root, &ctx)
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.components.keys().collect();
        names.sort();
        f.debug_struct("App")
            .field("components", &names)
            .field("methods", &self.methods)
            .field("options", &self.options)
            .finish()
    }
}
