//! Executor contract and row types.
//!
//! The compiler never talks to a database itself: a terminal builder call
//! produces a `(sql, params)` pair and hands it to an [`Executor`]. Drivers,
//! pools, and result hydration beyond the plain [`Row`] map live behind this
//! trait.

use crate::error::OrmResult;
use crate::qb::ParamList;
use crate::value::Value;

/// Executes a compiled statement against some backend.
///
/// Implementations receive the SQL text and the bound parameters in
/// placeholder order. Errors are propagated to the caller unchanged.
pub trait Executor {
    fn execute(&self, sql: &str, params: &ParamList) -> OrmResult<RowSet>;
}

/// The rows produced by one statement.
pub type RowSet = Vec<Row>;

/// One fetched row: an ordered field-to-value map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an existing value of the same name in place.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| *name == field) {
            slot.1 = value;
        } else {
            self.fields.push((field, value));
        }
    }

    /// Look up a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Export the row as a JSON object, preserving field order.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.fields {
            let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
            map.insert(name.clone(), json);
        }
        serde_json::Value::Object(map)
    }
}

impl From<Vec<(String, Value)>> for Row {
    fn from(fields: Vec<(String, Value)>) -> Self {
        let mut row = Row::new();
        for (name, value) in fields {
            row.set(name, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut row = Row::new();
        row.set("name", Value::from("Fred"));
        row.set("age", Value::from(10));
        row.set("name", Value::from("Joe"));
        assert_eq!(row.get("name"), Some(&Value::from("Joe")));
        let order: Vec<_> = row.iter().map(|(name, _)| name.to_string()).collect();
        assert_eq!(order, vec!["name", "age"]);
    }

    #[test]
    fn to_json_preserves_fields() {
        let mut row = Row::new();
        row.set("id", Value::from(1));
        row.set("name", Value::from("Fred"));
        assert_eq!(
            row.to_json(),
            serde_json::json!({"id": 1, "name": "Fred"})
        );
    }
}
