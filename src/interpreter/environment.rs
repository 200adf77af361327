// File: src/interpreter/environment.rs
//
// Variable storage for the Quasi evaluator.
// Maps identifier names to the scalar they were last assigned.

use std::collections::HashMap;

/// Name to value bindings for one evaluation session
///
/// The environment is written only by assignment and read only by identifier
/// lookups. It outlives individual expressions: a REPL keeps one environment
/// for every line it evaluates.
///
/// # Examples
///
/// ```
/// use quasi::interpreter::Environment;
///
/// let mut env = Environment::new();
/// env.set("x", 10.0);
/// assert_eq!(env.get("x"), Some(10.0));
///
/// env.set("x", 11.0);                  // rebinding replaces the old value
/// assert_eq!(env.get("x"), Some(11.0));
/// assert_eq!(env.get("y"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Environment {
    vars: HashMap<String, f64>,
}

impl Environment {
    pub fn new() -> Self {
        Environment { vars: HashMap::new() }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.get(name).copied()
    }

    /// Binds `name` to `value`, replacing any previous binding
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.vars.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.vars.remove(name)
    }

    /// Bound names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.vars.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.vars.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }
}
