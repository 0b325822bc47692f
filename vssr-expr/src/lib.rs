pub mod ast;
pub mod cache;
pub mod context;
pub mod error;
pub mod eval;
pub mod parse;
pub mod pipe;
pub mod value;

pub use ast::{BinaryOperator, Expression, ObjectKey, PathSegment};
pub use cache::CachingExpressionParser;
pub use context::{Context, Method, Methods};
pub use error::{EvalError, ParseError};
pub use parse::{BasicExpressionParser, ExpressionParser, parse_expression};
pub use pipe::{FilterCall, Pipeline, split_pipeline};
pub use serde_json::{Map, Value};
