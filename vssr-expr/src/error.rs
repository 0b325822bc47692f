use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("invalid expression `{source_text}`: {message}")]
    Syntax {
        source_text: String,
        message: String,
    },
    #[error("numeric literal `{0}` is out of range")]
    Number(String),
}

impl ParseError {
    /// Names `source` in a syntax error that has no source text of its own.
    pub(crate) fn or_source(self, source: &str) -> Self {
        match self {
            ParseError::Syntax {
                source_text,
                message,
            } if source_text.is_empty() => ParseError::Syntax {
                source_text: source.to_string(),
                message,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined variable `{path}`")]
    UndefinedVariable { path: String },

    #[error("method `{name}` is undefined")]
    UndefinedMethod { name: String },

    #[error("filter `{name}` is undefined")]
    UndefinedFilter { name: String },

    #[error("operator `{operator}` cannot compare {left} with {right}")]
    TypeMismatch {
        operator: &'static str,
        left: &'static str,
        right: &'static str,
    },
}
