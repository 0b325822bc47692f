use std::sync::Arc;

use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use serde_json::Number;

use crate::ast::{BinaryOperator, Expression, ObjectKey, PathSegment};
use crate::error::ParseError;
use crate::pipe::{Pipeline, split_pipeline};

#[derive(pest_derive::Parser)]
#[grammar = "expr.pest"]
struct ExprGrammar;

/// Turns expression source into a shareable tree.
pub trait ExpressionParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<Arc<Expression>, ParseError>;
}

/// Parses every call from scratch. Wrap it in
/// [`CachingExpressionParser`](crate::CachingExpressionParser) for reuse.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicExpressionParser;

impl BasicExpressionParser {
    pub fn new() -> Self {
        Self
    }
}

impl ExpressionParser for BasicExpressionParser {
    fn parse(&self, source: &str) -> Result<Arc<Expression>, ParseError> {
        let source = source.trim();
        let pipeline = split_pipeline(source);
        let expr = if pipeline.has_filters() {
            build_pipeline(source, &pipeline)
        } else {
            parse_expression(source)
        };
        Ok(Arc::new(expr.map_err(|e| e.or_source(source))?))
    }
}

/// Parses a single expression without pipeline handling.
pub fn parse_expression(source: &str) -> Result<Expression, ParseError> {
    let mut pairs = ExprGrammar::parse(Rule::expression, source).map_err(|e| {
        let column = match e.line_col {
            LineColLocation::Pos((_, col)) | LineColLocation::Span((_, col), _) => col,
        };
        ParseError::Syntax {
            source_text: source.to_string(),
            message: format!("{} at column {column}", e.variant.message()),
        }
    })?;
    let root = pairs.next().ok_or_else(|| syntax(source, "empty input"))?;
    let expr = root
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| syntax(source, "expected an expression"))?;
    build(expr).map_err(|e| e.or_source(source))
}

fn build_pipeline(source: &str, pipeline: &Pipeline) -> Result<Expression, ParseError> {
    let mut piped = pipeline
        .expressions
        .iter()
        .map(|src| parse_expression(src))
        .collect::<Result<Vec<_>, _>>()?;

    for filter in &pipeline.filters {
        let mut arguments = std::mem::take(&mut piped);
        for arg in &filter.arguments {
            arguments.push(parse_expression(arg)?);
        }
        piped = vec![Expression::Filter {
            name: filter.name.clone(),
            arguments,
        }];
    }

    match piped.pop() {
        Some(expr) if piped.is_empty() => Ok(expr),
        _ => Err(syntax(source, "malformed filter pipeline")),
    }
}

fn syntax(source: &str, message: &str) -> ParseError {
    ParseError::Syntax {
        source_text: source.to_string(),
        message: message.to_string(),
    }
}

fn build(pair: Pair<Rule>) -> Result<Expression, ParseError> {
    let text = pair.as_str();
    match pair.as_rule() {
        Rule::expr | Rule::relational => {
            let mut inner = pair.into_inner();
            let first = inner
                .next()
                .ok_or_else(|| syntax(text, "missing operand"))?;
            let mut left = build(first)?;
            while let Some(op) = inner.next() {
                let operator = BinaryOperator::from_symbol(op.as_str())
                    .ok_or_else(|| syntax(op.as_str(), "unknown operator"))?;
                let right = inner
                    .next()
                    .ok_or_else(|| syntax(text, "missing right operand"))?;
                left = Expression::Binary {
                    left: Box::new(left),
                    operator,
                    right: Box::new(build(right)?),
                };
            }
            Ok(left)
        }
        Rule::unary => {
            let mut negations = 0;
            let mut operand = None;
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::not => negations += 1,
                    _ => operand = Some(build(p)?),
                }
            }
            let mut expr = operand.ok_or_else(|| syntax(text, "missing operand"))?;
            for _ in 0..negations {
                expr = Expression::Negation(Box::new(expr));
            }
            Ok(expr)
        }
        Rule::null => Ok(Expression::Null),
        Rule::boolean => Ok(Expression::Bool(pair.as_str() == "true")),
        Rule::number => build_number(pair.as_str()),
        Rule::string => Ok(Expression::String(string_contents(pair))),
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = inner
                .next()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default();
            let arguments = inner.map(build).collect::<Result<_, _>>()?;
            Ok(Expression::Call { name, arguments })
        }
        Rule::member => {
            let mut path = Vec::new();
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::ident => path.push(PathSegment::Name(p.as_str().to_string())),
                    Rule::dot_access => {
                        let name = p.into_inner().next().map(|i| i.as_str()).unwrap_or("");
                        path.push(PathSegment::Name(name.to_string()));
                    }
                    Rule::index_access => {
                        let key = first_inner(p)?;
                        path.push(PathSegment::Computed(Box::new(build(key)?)));
                    }
                    _ => {}
                }
            }
            Ok(Expression::Variable(path))
        }
        Rule::array => Ok(Expression::Array(
            pair.into_inner().map(build).collect::<Result<_, _>>()?,
        )),
        Rule::object => {
            let mut properties = Vec::new();
            for property in pair.into_inner() {
                let text = property.as_str();
                let mut inner = property.into_inner();
                let key = inner.next().ok_or_else(|| syntax(text, "missing key"))?;
                let key = match key.as_rule() {
                    Rule::string => ObjectKey::Static(string_contents(key)),
                    Rule::computed_key => ObjectKey::Computed(Box::new(build(first_inner(key)?)?)),
                    _ => ObjectKey::Static(key.as_str().to_string()),
                };
                let value = inner.next().ok_or_else(|| syntax(text, "missing value"))?;
                properties.push((key, build(value)?));
            }
            Ok(Expression::Object(properties))
        }
        _ => Err(syntax(text, "unexpected token")),
    }
}

fn first_inner(pair: Pair<Rule>) -> Result<Pair<Rule>, ParseError> {
    let text = pair.as_str().to_string();
    pair.into_inner()
        .next()
        .ok_or_else(|| syntax(&text, "expected an expression"))
}

fn build_number(text: &str) -> Result<Expression, ParseError> {
    let is_float = text.contains(['.', 'e', 'E']);
    if !is_float {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Expression::Number(Number::from(i)));
        }
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Expression::Number)
        .ok_or_else(|| ParseError::Number(text.to_string()))
}

fn string_contents(pair: Pair<Rule>) -> String {
    let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
    unescape(raw)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
