// Environment for variable bindings and scope management

use crate::runtime::values::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The runtime environment, which manages the scope chain for variable lookups.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    parent: Option<Arc<Environment>>,
    bindings: HashMap<String, Value>,
}

impl Environment {
    /// Creates a new, empty global environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new child environment that inherits from a parent.
    pub fn with_parent(parent: Arc<Environment>) -> Self {
        Environment {
            parent: Some(parent),
            bindings: HashMap::new(),
        }
    }

    /// Creates a child of a snapshot of this environment.
    pub fn new_child(&self) -> Self {
        Self::with_parent(Arc::new(self.clone()))
    }

    /// Looks up a name by searching the current environment and then its parents.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.get(name) {
            Some(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.lookup(name)
        } else {
            None
        }
    }

    /// Defines a new variable or updates an existing one in the current scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_shadows_parent() {
        let mut parent = Environment::new();
        parent.define("x", Value::Int(1));
        parent.define("y", Value::Int(2));
        let mut child = parent.new_child();
        child.define("x", Value::Int(10));

        assert_eq!(child.lookup("x"), Some(Value::Int(10)));
        assert_eq!(child.lookup("y"), Some(Value::Int(2)));
        assert_eq!(parent.lookup("x"), Some(Value::Int(1)));
        assert_eq!(child.lookup("z"), None);
    }
}
