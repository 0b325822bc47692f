use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Host function callable from templates, either as `name(args)` or as a
/// `| name(args)` filter.
pub type Method = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Name to callable map. Built once by the host and only read while
/// rendering.
#[derive(Clone, Default)]
pub struct Methods {
    entries: BTreeMap<String, Method>,
}

static NO_METHODS: Methods = Methods::new();

impl Methods {
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(f));
    }

    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.register(name, f);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Method> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Variables visible to an expression. Loop iterations push a child scope
/// holding only the loop variable; lookups fall through to the parent.
#[derive(Debug)]
pub struct Context<'p> {
    bindings: Map<String, Value>,
    parent: Option<&'p Context<'p>>,
    methods: &'p Methods,
}

impl Context<'static> {
    pub fn new(bindings: Map<String, Value>) -> Self {
        Self {
            bindings,
            parent: None,
            methods: &NO_METHODS,
        }
    }
}

impl<'p> Context<'p> {
    pub fn with_methods(bindings: Map<String, Value>, methods: &'p Methods) -> Self {
        Self {
            bindings,
            parent: None,
            methods,
        }
    }

    /// Child scope binding a single name.
    pub fn extend(&self, name: impl Into<String>, value: Value) -> Context<'_> {
        let mut bindings = Map::new();
        bindings.insert(name.into(), value);
        self.extend_with(bindings)
    }

    pub fn extend_with(&self, bindings: Map<String, Value>) -> Context<'_> {
        Context {
            bindings,
            parent: Some(self),
            methods: self.methods,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        match self.bindings.get(name) {
            Some(value) => Some(value),
            None => self.parent.and_then(|p| p.lookup(name)),
        }
    }

    pub fn methods(&self) -> &'p Methods {
        self.methods
    }
}
