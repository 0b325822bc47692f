use std::fmt;

use serde_json::Number;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    StrictEq, // ===
    StrictNe, // !==
    LooseEq,  // ==
    LooseNe,  // !=
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "===" => Self::StrictEq,
            "!==" => Self::StrictNe,
            "==" => Self::LooseEq,
            "!=" => Self::LooseNe,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::StrictEq => "===",
            Self::StrictNe => "!==",
            Self::LooseEq => "==",
            Self::LooseNe => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Identity operators also accept `null` operands.
    pub fn is_identity(self) -> bool {
        matches!(self, Self::StrictEq | Self::StrictNe)
    }
}

/// One step of a member access chain: `.name` or `[expr]`.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Name(String),
    Computed(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKey {
    Static(String),
    Computed(Box<Expression>),
}

/// Parsed template expression. Immutable once built; evaluation lives in
/// [`crate::eval`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// `a.b[c]`; the first segment is always a plain name.
    Variable(Vec<PathSegment>),
    Negation(Box<Expression>),
    Binary {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// `name(args)`, resolved against the host methods when evaluated.
    Call {
        name: String,
        arguments: Vec<Expression>,
    },
    /// One stage of a `value | name(args)` pipeline. `arguments` holds the
    /// piped-in value(s) followed by the filter's own arguments.
    Filter {
        name: String,
        arguments: Vec<Expression>,
    },
    Array(Vec<Expression>),
    Object(Vec<(ObjectKey, Expression)>),
}

impl Expression {
    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(vec![PathSegment::Name(name.into())])
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for ch in s.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            _ => write!(f, "{ch}")?,
        }
    }
    f.write_str("'")
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Null => f.write_str("null"),
            Expression::Bool(b) => write!(f, "{b}"),
            Expression::Number(n) => write!(f, "{n}"),
            Expression::String(s) => write_quoted(f, s),
            Expression::Variable(path) => {
                for (i, segment) in path.iter().enumerate() {
                    match segment {
                        PathSegment::Name(name) if i == 0 => f.write_str(name)?,
                        PathSegment::Name(name) => write!(f, ".{name}")?,
                        PathSegment::Computed(expr) => write!(f, "[{expr}]")?,
                    }
                }
                Ok(())
            }
            Expression::Negation(inner) => match inner.as_ref() {
                Expression::Binary { .. } => write!(f, "!({inner})"),
                _ => write!(f, "!{inner}"),
            },
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                for (i, side) in [left, right].into_iter().enumerate() {
                    if i == 1 {
                        write!(f, " {} ", operator.symbol())?;
                    }
                    match side.as_ref() {
                        Expression::Binary { .. } => write!(f, "({side})")?,
                        _ => write!(f, "{side}")?,
                    }
                }
                Ok(())
            }
            Expression::Call { name, arguments } => {
                write!(f, "{name}(")?;
                write_list(f, arguments)?;
                f.write_str(")")
            }
            Expression::Filter { name, arguments } => match arguments.split_first() {
                Some((head, rest)) => {
                    write!(f, "{head} | {name}")?;
                    if !rest.is_empty() {
                        f.write_str("(")?;
                        write_list(f, rest)?;
                        f.write_str(")")?;
                    }
                    Ok(())
                }
                None => write!(f, "{name}()"),
            },
            Expression::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Expression::Object(properties) => {
                if properties.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (key, value)) in properties.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match key {
                        ObjectKey::Static(name) => write_quoted(f, name)?,
                        ObjectKey::Computed(expr) => write!(f, "[{expr}]")?,
                    }
                    write!(f, ": {value}")?;
                }
                f.write_str(" }")
            }
        }
    }
}
