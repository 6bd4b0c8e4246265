//! Condition model shared by the WHERE and HAVING compilers.
//!
//! Both clauses compile to the same grammar; only the leading keyword differs,
//! so the builder keeps two lists of the same [`Condition`] type. Compiling a
//! condition appends its bound values to the statement's [`ParamList`] at the
//! moment its placeholders are emitted, which keeps the value sequence aligned
//! with the left-to-right placeholder order.

use crate::ident::Dialect;
use crate::qb::param::ParamList;
use crate::value::Value;

/// Comparison operator for simple conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    NotLike,
}

impl CompareOp {
    /// SQL spelling of the operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Like => "LIKE",
            CompareOp::NotLike => "NOT LIKE",
        }
    }

    /// Parse an operator override as accepted by `where_any_is`.
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "=" => Some(CompareOp::Eq),
            "!=" | "<>" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Lte),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Gte),
            "LIKE" => Some(CompareOp::Like),
            "NOT LIKE" => Some(CompareOp::NotLike),
            _ => None,
        }
    }
}

/// A single WHERE/HAVING predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `` `col` op ? ``
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },

    /// `` `col` IN (?, ?, ...) `` or the NOT IN form
    InList {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },

    /// `` `col` IS NULL `` or `` `col` IS NOT NULL ``
    NullCheck { column: String, is_null: bool },

    /// Raw fragment emitted verbatim with its own parameters
    Raw { sql: String, params: Vec<Value> },

    /// OR-group of AND-groups: `(( a AND b ) OR ( c AND d ))`
    AnyOf { groups: Vec<Vec<Condition>> },
}

impl Condition {
    /// Compile this condition, appending bound values to `params`.
    pub(crate) fn build(&self, dialect: Dialect, params: &mut ParamList) -> String {
        match self {
            Condition::Compare { column, op, value } => {
                params.push(value.clone());
                format!("{} {} ?", dialect.quote(column), op.as_sql())
            }
            Condition::InList {
                column,
                values,
                negated,
            } => {
                let placeholders: Vec<&str> = values
                    .iter()
                    .map(|v| {
                        params.push(v.clone());
                        "?"
                    })
                    .collect();
                let op = if *negated { "NOT IN" } else { "IN" };
                format!(
                    "{} {} ({})",
                    dialect.quote(column),
                    op,
                    placeholders.join(", ")
                )
            }
            Condition::NullCheck { column, is_null } => {
                let op = if *is_null { "IS NULL" } else { "IS NOT NULL" };
                format!("{} {}", dialect.quote(column), op)
            }
            Condition::Raw { sql, params: own } => {
                for value in own {
                    params.push(value.clone());
                }
                sql.clone()
            }
            Condition::AnyOf { groups } => {
                let rendered: Vec<String> = groups
                    .iter()
                    .map(|group| {
                        let inner: Vec<String> =
                            group.iter().map(|c| c.build(dialect, params)).collect();
                        format!("( {} )", inner.join(" AND "))
                    })
                    .collect();
                format!("({})", rendered.join(" OR "))
            }
        }
    }
}

/// Compile a clause list, AND-joined, in insertion order.
pub(crate) fn build_clause_list(
    conditions: &[Condition],
    dialect: Dialect,
    params: &mut ParamList,
) -> String {
    let parts: Vec<String> = conditions.iter().map(|c| c.build(dialect, params)).collect();
    parts.join(" AND ")
}

/// Count `?` bind placeholders in a raw fragment.
///
/// A `?` inside a single- or double-quoted string literal is ordinary text,
/// not a placeholder. Doubled quote characters inside a literal read as
/// close-then-reopen, which is equivalent for counting purposes.
pub(crate) fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut in_quote: Option<char> = None;
    for ch in sql.chars() {
        match in_quote {
            Some(q) => {
                if ch == q {
                    in_quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => in_quote = Some(ch),
                '?' => count += 1,
                _ => {}
            },
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(cond: &Condition) -> (String, ParamList) {
        let mut params = ParamList::new();
        let sql = cond.build(Dialect::Mysql, &mut params);
        (sql, params)
    }

    #[test]
    fn compare_emits_quoted_column_and_placeholder() {
        let cond = Condition::Compare {
            column: "name".into(),
            op: CompareOp::Eq,
            value: Value::from("Fred"),
        };
        let (sql, params) = build(&cond);
        assert_eq!(sql, "`name` = ?");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn in_list_emits_one_placeholder_per_value() {
        let cond = Condition::InList {
            column: "name".into(),
            values: vec![Value::from("Fred"), Value::from("Joe")],
            negated: false,
        };
        let (sql, params) = build(&cond);
        assert_eq!(sql, "`name` IN (?, ?)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn null_checks_bind_nothing() {
        let cond = Condition::NullCheck {
            column: "name".into(),
            is_null: false,
        };
        let (sql, params) = build(&cond);
        assert_eq!(sql, "`name` IS NOT NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn any_of_groups_or_joined_with_inner_ands() {
        let row = |a: i64, b: i64| {
            vec![
                Condition::Compare {
                    column: "id1".into(),
                    op: CompareOp::Eq,
                    value: Value::from(a),
                },
                Condition::Compare {
                    column: "id2".into(),
                    op: CompareOp::Eq,
                    value: Value::from(b),
                },
            ]
        };
        let cond = Condition::AnyOf {
            groups: vec![row(10, 20), row(20, 30)],
        };
        let (sql, params) = build(&cond);
        assert_eq!(
            sql,
            "(( `id1` = ? AND `id2` = ? ) OR ( `id1` = ? AND `id2` = ? ))"
        );
        let values: Vec<_> = params.values().cloned().collect();
        assert_eq!(
            values,
            vec![
                Value::Int(10),
                Value::Int(20),
                Value::Int(20),
                Value::Int(30)
            ]
        );
    }

    #[test]
    fn clause_list_is_and_joined_in_insertion_order() {
        let conditions = vec![
            Condition::Compare {
                column: "name".into(),
                op: CompareOp::Eq,
                value: Value::from("Fred"),
            },
            Condition::Compare {
                column: "age".into(),
                op: CompareOp::Gt,
                value: Value::from(10),
            },
        ];
        let mut params = ParamList::new();
        let sql = build_clause_list(&conditions, Dialect::Mysql, &mut params);
        assert_eq!(sql, "`name` = ? AND `age` > ?");
    }

    #[test]
    fn placeholder_count_skips_quoted_literals() {
        assert_eq!(count_placeholders("`a` = ? AND `b` = ?"), 2);
        assert_eq!(count_placeholders("comments LIKE \"has been released?%\""), 0);
        assert_eq!(count_placeholders("STRFTIME(\"%Y\", \"now\") = ?"), 1);
        assert_eq!(count_placeholders("note = 'what?' AND x = ?"), 1);
    }

    #[test]
    fn compare_op_parse_round_trip() {
        for op in [
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Lt,
            CompareOp::Lte,
            CompareOp::Gt,
            CompareOp::Gte,
            CompareOp::Like,
            CompareOp::NotLike,
        ] {
            assert_eq!(CompareOp::parse(op.as_sql()), Some(op));
        }
        assert_eq!(CompareOp::parse("BETWEEN"), None);
    }
}
