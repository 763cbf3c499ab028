//! Environment for variable bindings

use super::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared reference to an environment. Closures hold these, so a frame stays
/// alive as long as anything captured it.
pub type EnvRef = Rc<RefCell<Environment>>;

/// Environment holding variable bindings
#[derive(Debug, Clone)]
pub struct Environment {
    /// Variable bindings in this scope
    bindings: HashMap<String, Value>,
    /// Parent environment for lexical scoping
    parent: Option<EnvRef>,
}

impl Environment {
    /// Create a new global environment
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    /// Create a new environment with a parent
    pub fn with_parent(parent: EnvRef) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Define a binding in the current scope, shadowing any enclosing one
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Look up a variable, walking parent links until found
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.get(name) {
            Some(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get(name)
        } else {
            None
        }
    }

    /// Mutate an existing binding in place, walking parent links until found.
    /// Returns false if the name is not bound anywhere in the chain.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.bindings.contains_key(name) {
            self.bindings.insert(name.to_string(), value);
            true
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// Get all bindings (for debugging)
    pub fn bindings(&self) -> &HashMap<String, Value> {
        &self.bindings
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a child environment from a parent reference
pub fn child_env(parent: &EnvRef) -> EnvRef {
    Environment::with_parent(Rc::clone(parent)).into_ref()
}

/// Walk exactly `distance` parent links from `env`.
///
/// Valid only while the runtime frame structure mirrors the nesting the
/// resolver observed; the resolver guarantees the distance is in range.
fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current = Rc::clone(env);
    for _ in 0..distance {
        let parent = current.borrow().parent.as_ref().map(Rc::clone)?;
        current = parent;
    }
    Some(current)
}

/// Read a name in the frame exactly `distance` hops up, with no search
pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
    let frame = ancestor(env, distance)?;
    let value = frame.borrow().bindings.get(name).cloned();
    value
}

/// Write a name in the frame exactly `distance` hops up, with no search.
/// Returns false if the frame chain is shorter than `distance` or the name
/// is not bound in that frame.
pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
    match ancestor(env, distance) {
        Some(frame) => {
            let mut frame = frame.borrow_mut();
            if frame.bindings.contains_key(name) {
                frame.bindings.insert(name.to_string(), value);
                true
            } else {
                false
            }
        }
        None => false,
    }
}
