//! Ordered parameter binding for compiled statements.
//!
//! A [`ParamList`] is scoped to one compiled statement and is strictly
//! append-only: every clause compiler pushes values at the moment it emits the
//! matching placeholder, so the sequence always matches the left-to-right
//! order of placeholders in the final SQL text.

use crate::value::Value;
use std::fmt;

/// A single bound parameter.
///
/// Positional parameters have no name; named parameters (only produced by
/// `raw_query` with `:name` placeholders) keep their key verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub value: Value,
}

/// An append-only ordered sequence of bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Append a positional parameter.
    pub fn push(&mut self, value: Value) {
        self.params.push(Param { name: None, value });
    }

    /// Append a named parameter, keeping the key as supplied.
    pub fn push_named(&mut self, name: impl Into<String>, value: Value) {
        self.params.push(Param {
            name: Some(name.into()),
            value,
        });
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over the bound parameters in placeholder order.
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    /// Iterate over the bound values in placeholder order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.params.iter().map(|p| &p.value)
    }

    /// Append all parameters from another list.
    pub fn extend(&mut self, other: &ParamList) {
        self.params.extend(other.params.iter().cloned());
    }

    /// Render the log dump: `{0 => 'Fred', 1 => 10}` for positional
    /// parameters, `{:name => 'Fred'}` for named ones.
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParamList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &param.name {
                Some(name) => write!(f, "{name} => {}", param.value)?,
                None => write!(f, "{i} => {}", param.value)?,
            }
        }
        f.write_str("}")
    }
}

impl From<Vec<Value>> for ParamList {
    fn from(values: Vec<Value>) -> Self {
        let mut list = ParamList::new();
        for value in values {
            list.push(value);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_dump_uses_indices() {
        let mut params = ParamList::new();
        params.push(Value::from("Fred"));
        params.push(Value::from(10));
        assert_eq!(params.dump(), "{0 => 'Fred', 1 => 10}");
    }

    #[test]
    fn named_dump_keeps_keys_verbatim() {
        let mut params = ParamList::new();
        params.push_named(":name", Value::from("Fred"));
        params.push_named(":age", Value::from(5));
        assert_eq!(params.dump(), "{:name => 'Fred', :age => 5}");
    }

    #[test]
    fn extend_preserves_order() {
        let mut a = ParamList::new();
        a.push(Value::from(1));
        let mut b = ParamList::new();
        b.push(Value::from(2));
        a.extend(&b);
        let values: Vec<_> = a.values().cloned().collect();
        assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
    }
}
