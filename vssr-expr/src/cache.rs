use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::ast::Expression;
use crate::error::ParseError;
use crate::parse::{BasicExpressionParser, ExpressionParser};

/// Memoises parses by trimmed source text for the life of the parser.
///
/// Two threads missing on the same key may both parse; the first insert
/// wins and both callers get that instance back.
#[derive(Debug, Default)]
pub struct CachingExpressionParser<P = BasicExpressionParser> {
    inner: P,
    cache: RwLock<HashMap<String, Arc<Expression>>>,
}

impl CachingExpressionParser<BasicExpressionParser> {
    pub fn new() -> Self {
        Self::wrap(BasicExpressionParser)
    }
}

impl<P: ExpressionParser> CachingExpressionParser<P> {
    pub fn wrap(inner: P) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: ExpressionParser> ExpressionParser for CachingExpressionParser<P> {
    fn parse(&self, source: &str) -> Result<Arc<Expression>, ParseError> {
        let key = source.trim();
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Ok(Arc::clone(hit));
        }

        tracing::debug!(expression = key, "expression cache miss");
        let parsed = self.inner.parse(key)?;
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(key.to_string()).or_insert(parsed)))
    }
}
