//! Row-backed records and the write-statement compiler.
//!
//! A [`Record`] pairs the data fetched for one row with a dirty-field list.
//! `save` compiles an `INSERT` for a record that has never been persisted and
//! an `UPDATE` otherwise; only dirty fields are written, in the order they
//! were first set. A persisted record with no dirty fields saves as a no-op
//! without contacting the executor.

use crate::client::Row;
use crate::error::{OrmError, OrmResult};
use crate::qb::ParamList;
use crate::session::Session;
use crate::value::Value;

/// A pending field write: a bound value or a raw SQL expression.
#[derive(Debug, Clone, PartialEq)]
enum SetField {
    Value(Value),
    Expr(String),
}

/// One table row with change tracking.
#[derive(Debug, Clone)]
pub struct Record<'s> {
    session: &'s Session,
    table: String,
    id_columns: Vec<String>,
    data: Row,
    pending: Vec<(String, SetField)>,
    is_new: bool,
}

impl<'s> Record<'s> {
    pub(crate) fn new_unsaved(session: &'s Session, table: String, id_columns: Vec<String>) -> Self {
        Self {
            session,
            table,
            id_columns,
            data: Row::new(),
            pending: Vec::new(),
            is_new: true,
        }
    }

    pub(crate) fn from_row(
        session: &'s Session,
        table: String,
        id_columns: Vec<String>,
        data: Row,
    ) -> Self {
        Self {
            session,
            table,
            id_columns,
            data,
            pending: Vec::new(),
            is_new: false,
        }
    }

    /// The table this record belongs to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether the record has never been persisted.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether any field writes are pending.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Read a field: a pending plain value shadows the fetched data. A field
    /// pending as an expression has no client-side value and reads as `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self.pending.iter().rev().find(|(name, _)| name == field) {
            Some((_, SetField::Value(value))) => Some(value),
            Some((_, SetField::Expr(_))) => None,
            None => self.data.get(field),
        }
    }

    /// The value of the single id column, when present.
    pub fn id(&self) -> Option<&Value> {
        if self.id_columns.len() == 1 {
            self.get(&self.id_columns[0])
        } else {
            None
        }
    }

    fn put(&mut self, field: &str, set: SetField) {
        // A later write to the same field keeps the field's original position
        // in the SET list but replaces what is written.
        if let Some(slot) = self.pending.iter_mut().find(|(name, _)| name == field) {
            slot.1 = set;
        } else {
            self.pending.push((field.to_string(), set));
        }
    }

    /// Stage a field write.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.put(field, SetField::Value(value.into()));
        self
    }

    /// Stage several field writes, in slice order.
    pub fn set_many(&mut self, fields: &[(&str, Value)]) -> &mut Self {
        for (field, value) in fields {
            self.put(field, SetField::Value(value.clone()));
        }
        self
    }

    /// Stage a field write whose value is a raw SQL expression, emitted
    /// verbatim in place of a placeholder.
    pub fn set_expr(&mut self, field: &str, expr: &str) -> &mut Self {
        self.put(field, SetField::Expr(expr.to_string()));
        self
    }

    /// Stage several expression writes, in slice order.
    pub fn set_expr_many(&mut self, fields: &[(&str, &str)]) -> &mut Self {
        for (field, expr) in fields {
            self.put(field, SetField::Expr((*expr).to_string()));
        }
        self
    }

    /// Export the fetched data as a JSON object. Pending writes are not
    /// included until saved.
    pub fn to_json(&self) -> serde_json::Value {
        self.data.to_json()
    }

    /// One `id = ?` equality per id column, AND-joined, with the values read
    /// from the fetched data. Fails when any id column has no value.
    fn id_predicate(&self, params: &mut ParamList) -> OrmResult<String> {
        let dialect = self.session.dialect();
        let mut parts = Vec::with_capacity(self.id_columns.len());
        for column in &self.id_columns {
            let value = self
                .data
                .get(column)
                .cloned()
                .ok_or_else(|| OrmError::MissingIdValue(column.clone()))?;
            params.push(value);
            parts.push(format!("{} = ?", dialect.quote(column)));
        }
        Ok(parts.join(" AND "))
    }

    fn build_insert(&self) -> (String, ParamList) {
        let dialect = self.session.dialect();
        let mut params = ParamList::new();
        let mut columns = Vec::with_capacity(self.pending.len());
        let mut placeholders = Vec::with_capacity(self.pending.len());
        for (field, set) in &self.pending {
            columns.push(dialect.quote(field));
            match set {
                SetField::Value(value) => {
                    params.push(value.clone());
                    placeholders.push("?".to_string());
                }
                SetField::Expr(expr) => placeholders.push(expr.clone()),
            }
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            dialect.quote(&self.table),
            columns.join(", "),
            placeholders.join(", ")
        );
        (sql, params)
    }

    fn build_update(&self) -> OrmResult<(String, ParamList)> {
        let dialect = self.session.dialect();
        let mut params = ParamList::new();
        let mut parts = Vec::with_capacity(self.pending.len());
        for (field, set) in &self.pending {
            let rhs = match set {
                SetField::Value(value) => {
                    params.push(value.clone());
                    "?".to_string()
                }
                SetField::Expr(expr) => expr.clone(),
            };
            parts.push(format!("{} = {rhs}", dialect.quote(field)));
        }
        let mut sql = format!(
            "UPDATE {} SET {}",
            dialect.quote(&self.table),
            parts.join(", ")
        );
        sql.push_str(" WHERE ");
        sql.push_str(&self.id_predicate(&mut params)?);
        Ok((sql, params))
    }

    /// Persist the pending writes.
    ///
    /// A new record always inserts, even with nothing staged (the dialect's
    /// empty-row form). A persisted record updates only when something is
    /// staged; otherwise nothing is executed.
    pub fn save(&mut self) -> OrmResult<()> {
        let (sql, params) = if self.is_new {
            self.build_insert()
        } else {
            if self.pending.is_empty() {
                return Ok(());
            }
            self.build_update()?
        };
        self.session.run(&sql, &params)?;
        // Plain values become readable data; an expression's result stays
        // server-side until the row is refetched.
        for (field, set) in self.pending.drain(..) {
            if let SetField::Value(value) = set {
                self.data.set(field, value);
            }
        }
        self.is_new = false;
        Ok(())
    }

    /// Delete the row this record was fetched from, by its id predicate.
    pub fn delete(self) -> OrmResult<()> {
        let dialect = self.session.dialect();
        let mut params = ParamList::new();
        let predicate = self.id_predicate(&mut params)?;
        let sql = format!(
            "DELETE FROM {} WHERE {predicate}",
            dialect.quote(&self.table)
        );
        self.session.run(&sql, &params)?;
        Ok(())
    }
}
