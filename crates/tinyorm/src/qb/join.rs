//! Join model and compiler.
//!
//! Each join compiles to `<KEYWORD> `table`[ `alias`] ON <condition>` for a
//! table source, or `<raw join text>[ `alias`] ON <condition>` for a raw
//! source. A raw source is emitted verbatim (it carries its own join keyword
//! and any embedded sub-select) and its parameters are bound at that position,
//! before any condition parameters. Joins are emitted space-separated in
//! declaration order, ahead of WHERE.

use crate::ident::Dialect;
use crate::qb::param::ParamList;
use crate::value::Value;

/// Join keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Plain,
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Plain => "JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
        }
    }
}

/// ON condition of a join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinConstraint {
    /// Structured triple: both operands are auto-quoted column references.
    On {
        left: String,
        op: String,
        right: String,
    },
    /// Literal condition text, emitted unquoted.
    Literal(String),
}

impl From<(&str, &str, &str)> for JoinConstraint {
    fn from((left, op, right): (&str, &str, &str)) -> Self {
        JoinConstraint::On {
            left: left.to_string(),
            op: op.to_string(),
            right: right.to_string(),
        }
    }
}

impl From<&str> for JoinConstraint {
    fn from(text: &str) -> Self {
        JoinConstraint::Literal(text.to_string())
    }
}

/// Source of a join: a named table or a raw SQL fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinSource {
    Table { kind: JoinKind, table: String },
    Raw { sql: String, params: Vec<Value> },
}

/// One join clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub source: JoinSource,
    pub alias: Option<String>,
    pub constraint: JoinConstraint,
}

impl Join {
    /// Compile this join, appending any raw-source parameters to `params`.
    pub(crate) fn build(&self, dialect: Dialect, params: &mut ParamList) -> String {
        let mut sql = String::new();
        match &self.source {
            JoinSource::Table { kind, table } => {
                sql.push_str(kind.keyword());
                sql.push(' ');
                sql.push_str(&dialect.quote(table));
            }
            JoinSource::Raw { sql: raw, params: own } => {
                sql.push_str(raw);
                for value in own {
                    params.push(value.clone());
                }
            }
        }
        if let Some(alias) = &self.alias {
            sql.push(' ');
            sql.push_str(&dialect.quote(alias));
        }
        sql.push_str(" ON ");
        match &self.constraint {
            JoinConstraint::On { left, op, right } => {
                sql.push_str(&dialect.quote(left));
                sql.push(' ');
                sql.push_str(op);
                sql.push(' ');
                sql.push_str(&dialect.quote(right));
            }
            JoinConstraint::Literal(text) => sql.push_str(text),
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_join_quotes_operands() {
        let join = Join {
            source: JoinSource::Table {
                kind: JoinKind::Plain,
                table: "widget_handle".into(),
            },
            alias: None,
            constraint: JoinConstraint::On {
                left: "widget_handle.widget_id".into(),
                op: "=".into(),
                right: "widget.id".into(),
            },
        };
        let mut params = ParamList::new();
        assert_eq!(
            join.build(Dialect::Mysql, &mut params),
            "JOIN `widget_handle` ON `widget_handle`.`widget_id` = `widget`.`id`"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn literal_constraint_is_emitted_verbatim() {
        let join = Join {
            source: JoinSource::Table {
                kind: JoinKind::Plain,
                table: "widget_handle".into(),
            },
            alias: None,
            constraint: JoinConstraint::Literal("widget_handle.widget_id = widget.id".into()),
        };
        let mut params = ParamList::new();
        assert_eq!(
            join.build(Dialect::Mysql, &mut params),
            "JOIN `widget_handle` ON widget_handle.widget_id = widget.id"
        );
    }

    #[test]
    fn raw_join_binds_its_own_params_first() {
        let join = Join {
            source: JoinSource::Raw {
                sql: "INNER JOIN ( SELECT * FROM `widget_handle` WHERE name LIKE ? )".into(),
                params: vec![Value::from("%button%")],
            },
            alias: Some("widget_handle".into()),
            constraint: JoinConstraint::On {
                left: "widget_handle.widget_id".into(),
                op: "=".into(),
                right: "widget.id".into(),
            },
        };
        let mut params = ParamList::new();
        let sql = join.build(Dialect::Mysql, &mut params);
        assert_eq!(
            sql,
            "INNER JOIN ( SELECT * FROM `widget_handle` WHERE name LIKE ? ) `widget_handle` \
             ON `widget_handle`.`widget_id` = `widget`.`id`"
        );
        assert_eq!(params.len(), 1);
    }
}
