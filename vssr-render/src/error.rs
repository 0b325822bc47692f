use thiserror::Error;
use vssr_dom::DomError;
use vssr_expr::{EvalError, ParseError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("malformed template: {0}")]
    MalformedTemplate(#[from] DomError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to evaluate `{expression}`: {source}")]
    Eval {
        expression: String,
        source: EvalError,
    },

    #[error("cannot bind array or object from `{expression}` to attribute `{attribute}`")]
    ArrayBinding {
        attribute: String,
        expression: String,
    },

    #[error("`{expression}` must evaluate to a list or object to loop over, got {found}")]
    NotIterable {
        expression: String,
        found: &'static str,
    },

    #[error("invalid loop directive `{directive}`, expected `item in list`")]
    InvalidLoop { directive: String },

    #[error("unknown component: {name}")]
    UnknownComponent { name: String },

    #[error("failed to load template for component `{name}`: {message}")]
    TemplateLoad { name: String, message: String },

    #[error("component `{component}` exceeds the nesting limit of {limit}")]
    RecursionLimit { component: String, limit: usize },
}
