use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("empty document")]
    EmptyDocument,

    #[error("template contained no root node")]
    NoRootNode,

    #[error("template should only have one root node, found {count}")]
    MultipleRootNodes { count: usize },

    #[error("expected <{expected}>, got <{found}>")]
    UnexpectedElement {
        expected: &'static str,
        found: String,
    },

    #[error("input is not valid UTF-8")]
    InvalidUtf8,
}
