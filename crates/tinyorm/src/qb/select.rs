//! Fluent query builder and the SELECT/aggregate compiler.
//!
//! A [`QueryBuilder`] accumulates clause lists in insertion order; a terminal
//! call compiles them into `(sql, params)` with a fixed clause order
//! (SELECT, FROM, JOIN, WHERE, GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET)
//! regardless of the call order used to build the query, then hands the pair
//! to the session's executor.
//!
//! Fluent calls never fail; a defect detected while chaining (a malformed raw
//! fragment, a compound-key row missing a member) is parked in the builder and
//! surfaced by the terminal call before anything is logged or executed.

use crate::client::RowSet;
use crate::error::{OrmError, OrmResult};
use crate::ident::Dialect;
use crate::qb::expr::{CompareOp, Condition, build_clause_list, count_placeholders};
use crate::qb::join::{Join, JoinConstraint, JoinKind, JoinSource};
use crate::qb::param::ParamList;
use crate::record::Record;
use crate::session::Session;
use crate::value::Value;
use std::fmt::Write;

/// One entry in the SELECT column list.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultColumn {
    /// Plain column reference, dotted paths allowed.
    Column(String),
    /// Column reference with an alias.
    ColumnAlias { column: String, alias: String },
    /// Raw expression, emitted verbatim.
    Expr(String),
    /// Raw expression with a quoted alias.
    ExprAlias { expr: String, alias: String },
}

impl ResultColumn {
    fn build(&self, dialect: Dialect) -> String {
        match self {
            ResultColumn::Column(column) => dialect.quote(column),
            ResultColumn::ColumnAlias { column, alias } => {
                format!("{} AS {}", dialect.quote(column), dialect.quote(alias))
            }
            ResultColumn::Expr(expr) => expr.clone(),
            ResultColumn::ExprAlias { expr, alias } => {
                format!("{} AS {}", expr, dialect.quote(alias))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum GroupExpr {
    Column(String),
    Expr(String),
}

#[derive(Debug, Clone, PartialEq)]
enum OrderSpec {
    Asc(String),
    Desc(String),
    Expr(String),
}

/// Fluent, write-once-then-compiled statement state for one table.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'s> {
    session: &'s Session,
    table: String,
    table_alias: Option<String>,
    columns: Vec<ResultColumn>,
    distinct: bool,
    joins: Vec<Join>,
    wheres: Vec<Condition>,
    group_by: Vec<GroupExpr>,
    havings: Vec<Condition>,
    orders: Vec<OrderSpec>,
    limit: Option<u64>,
    offset: Option<u64>,
    raw_statement: Option<(String, ParamList)>,
    id_columns: Vec<String>,
    build_error: Option<OrmError>,
}

impl<'s> QueryBuilder<'s> {
    pub(crate) fn new(session: &'s Session, table: &str) -> Self {
        Self {
            session,
            table: table.to_string(),
            table_alias: None,
            columns: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            wheres: Vec::new(),
            group_by: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            raw_statement: None,
            id_columns: vec!["id".to_string()],
            build_error: None,
        }
    }

    fn defect(&mut self, err: OrmError) {
        // First defect wins; later ones would be downstream noise.
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    /// With joins present, an unqualified column in a simple comparison is
    /// qualified with the table alias (or table name) to avoid ambiguity.
    fn qualified(&self, column: &str) -> String {
        if self.joins.is_empty() || column.contains('.') {
            column.to_string()
        } else {
            let table = self.table_alias.as_deref().unwrap_or(&self.table);
            format!("{table}.{column}")
        }
    }

    fn simple_condition(&self, column: &str, op: CompareOp, value: Value) -> Condition {
        Condition::Compare {
            column: self.qualified(column),
            op,
            value,
        }
    }

    // ==================== Result columns ====================

    /// Append one result column; replaces the default `*`.
    pub fn select(mut self, column: &str) -> Self {
        self.columns.push(ResultColumn::Column(column.to_string()));
        self
    }

    /// Append one aliased result column.
    pub fn select_as(mut self, column: &str, alias: &str) -> Self {
        self.columns.push(ResultColumn::ColumnAlias {
            column: column.to_string(),
            alias: alias.to_string(),
        });
        self
    }

    /// Append several result columns.
    pub fn select_many(mut self, columns: &[&str]) -> Self {
        for column in columns {
            self.columns.push(ResultColumn::Column((*column).to_string()));
        }
        self
    }

    /// Append a raw expression result column, emitted verbatim.
    pub fn select_expr(mut self, expr: &str) -> Self {
        self.columns.push(ResultColumn::Expr(expr.to_string()));
        self
    }

    /// Append a raw expression result column with an alias.
    pub fn select_expr_as(mut self, expr: &str, alias: &str) -> Self {
        self.columns.push(ResultColumn::ExprAlias {
            expr: expr.to_string(),
            alias: alias.to_string(),
        });
        self
    }

    /// Append several raw expression result columns.
    pub fn select_many_expr(mut self, exprs: &[&str]) -> Self {
        for expr in exprs {
            self.columns.push(ResultColumn::Expr((*expr).to_string()));
        }
        self
    }

    /// Compile `SELECT DISTINCT`.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== Joins ====================

    /// Append a join of the given kind.
    pub fn add_join(
        mut self,
        kind: JoinKind,
        table: &str,
        on: impl Into<JoinConstraint>,
        alias: Option<&str>,
    ) -> Self {
        self.joins.push(Join {
            source: JoinSource::Table {
                kind,
                table: table.to_string(),
            },
            alias: alias.map(str::to_string),
            constraint: on.into(),
        });
        self
    }

    /// Append a `JOIN`.
    pub fn join(self, table: &str, on: impl Into<JoinConstraint>) -> Self {
        self.add_join(JoinKind::Plain, table, on, None)
    }

    /// Append a `JOIN` with a table alias.
    pub fn join_as(self, table: &str, on: impl Into<JoinConstraint>, alias: &str) -> Self {
        self.add_join(JoinKind::Plain, table, on, Some(alias))
    }

    /// Append an `INNER JOIN`.
    pub fn inner_join(self, table: &str, on: impl Into<JoinConstraint>) -> Self {
        self.add_join(JoinKind::Inner, table, on, None)
    }

    /// Append a `LEFT OUTER JOIN`.
    pub fn left_outer_join(self, table: &str, on: impl Into<JoinConstraint>) -> Self {
        self.add_join(JoinKind::LeftOuter, table, on, None)
    }

    /// Append a `RIGHT OUTER JOIN`.
    pub fn right_outer_join(self, table: &str, on: impl Into<JoinConstraint>) -> Self {
        self.add_join(JoinKind::RightOuter, table, on, None)
    }

    /// Append a `FULL OUTER JOIN`.
    pub fn full_outer_join(self, table: &str, on: impl Into<JoinConstraint>) -> Self {
        self.add_join(JoinKind::FullOuter, table, on, None)
    }

    /// Append a raw join: `sql` is emitted verbatim (it carries its own join
    /// keyword) and the alias, when given, is quoted after it.
    pub fn raw_join(self, sql: &str, on: impl Into<JoinConstraint>, alias: &str) -> Self {
        self.raw_join_params(sql, on, alias, Vec::new())
    }

    /// Append a raw join whose body binds its own parameters, spliced in
    /// before any condition parameters.
    pub fn raw_join_params(
        mut self,
        sql: &str,
        on: impl Into<JoinConstraint>,
        alias: &str,
        params: Vec<Value>,
    ) -> Self {
        let expected = count_placeholders(sql);
        if expected != params.len() {
            self.defect(OrmError::malformed_clause(sql, expected, params.len()));
        }
        self.joins.push(Join {
            source: JoinSource::Raw {
                sql: sql.to_string(),
                params,
            },
            alias: Some(alias.to_string()),
            constraint: on.into(),
        });
        self
    }

    // ==================== WHERE ====================

    fn push_compare(mut self, column: &str, op: CompareOp, value: Value) -> Self {
        let cond = self.simple_condition(column, op, value);
        self.wheres.push(cond);
        self
    }

    /// Add `column = ?`.
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_compare(column, CompareOp::Eq, value.into())
    }

    /// Alias for [`QueryBuilder::where_eq`], the default operator.
    pub fn where_equal(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_eq(column, value)
    }

    /// Add `column != ?`.
    pub fn where_not_equal(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_compare(column, CompareOp::Ne, value.into())
    }

    /// Add `column < ?`.
    pub fn where_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_compare(column, CompareOp::Lt, value.into())
    }

    /// Add `column <= ?`.
    pub fn where_lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_compare(column, CompareOp::Lte, value.into())
    }

    /// Add `column > ?`.
    pub fn where_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_compare(column, CompareOp::Gt, value.into())
    }

    /// Add `column >= ?`.
    pub fn where_gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_compare(column, CompareOp::Gte, value.into())
    }

    /// Add `column LIKE ?`.
    pub fn where_like(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.push_compare(column, CompareOp::Like, pattern.into())
    }

    /// Add `column NOT LIKE ?`.
    pub fn where_not_like(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.push_compare(column, CompareOp::NotLike, pattern.into())
    }

    /// Add `column IN (?, ...)`.
    pub fn where_in(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.wheres.push(Condition::InList {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        });
        self
    }

    /// Add `column NOT IN (?, ...)`.
    pub fn where_not_in(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.wheres.push(Condition::InList {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        });
        self
    }

    /// Add `column IS NULL`.
    pub fn where_null(mut self, column: &str) -> Self {
        self.wheres.push(Condition::NullCheck {
            column: column.to_string(),
            is_null: true,
        });
        self
    }

    /// Add `column IS NOT NULL`.
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.wheres.push(Condition::NullCheck {
            column: column.to_string(),
            is_null: false,
        });
        self
    }

    /// Add a raw fragment with its own parameters, emitted verbatim.
    ///
    /// The number of `?` placeholders outside string literals must match the
    /// number of supplied parameters; a mismatch fails the terminal call.
    pub fn where_raw(mut self, sql: &str, params: Vec<Value>) -> Self {
        let expected = count_placeholders(sql);
        if expected != params.len() {
            self.defect(OrmError::malformed_clause(sql, expected, params.len()));
        }
        self.wheres.push(Condition::Raw {
            sql: sql.to_string(),
            params,
        });
        self
    }

    // ==================== Id-column predicates ====================

    /// Declare the id column for this table (default `id`).
    pub fn use_id_column(mut self, column: &str) -> Self {
        self.id_columns = vec![column.to_string()];
        self
    }

    /// Declare a compound id spec; members compile in the declared order.
    pub fn use_compound_id_column(mut self, columns: &[&str]) -> Self {
        self.id_columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    fn single_id_column(&mut self) -> Option<String> {
        if self.id_columns.len() == 1 {
            Some(self.id_columns[0].clone())
        } else {
            self.defect(OrmError::validation(
                "compound id spec requires the compound-key variant",
            ));
            None
        }
    }

    /// One equality condition per declared id column, in spec order. Extra
    /// keys in `row` are ignored; a missing member is an error.
    fn compound_id_conditions(
        &self,
        row: &[(&str, Value)],
        qualify: bool,
    ) -> OrmResult<Vec<Condition>> {
        let mut conditions = Vec::with_capacity(self.id_columns.len());
        for column in &self.id_columns {
            let value = row
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| OrmError::MissingIdColumn(column.clone()))?;
            let column = if qualify {
                self.qualified(column)
            } else {
                column.clone()
            };
            conditions.push(Condition::Compare {
                column,
                op: CompareOp::Eq,
                value,
            });
        }
        Ok(conditions)
    }

    /// Add an equality on the single declared id column.
    pub fn where_id_is(mut self, id: impl Into<Value>) -> Self {
        match self.single_id_column() {
            Some(column) => self.push_compare(&column, CompareOp::Eq, id.into()),
            None => self,
        }
    }

    /// Add an AND-group of equalities over a compound id spec.
    pub fn where_id_is_compound(mut self, row: &[(&str, Value)]) -> Self {
        match self.compound_id_conditions(row, true) {
            Ok(conditions) => self.wheres.extend(conditions),
            Err(err) => self.defect(err),
        }
        self
    }

    /// Add `id IN (?, ...)` on the single declared id column.
    pub fn where_id_in(mut self, ids: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        match self.single_id_column() {
            Some(column) => self.where_in(&column, ids),
            None => self,
        }
    }

    /// Add an OR-group of per-row AND-groups over a compound id spec, one
    /// group per supplied row.
    pub fn where_id_in_compound(mut self, rows: &[Vec<(&str, Value)>]) -> Self {
        let mut groups = Vec::with_capacity(rows.len());
        for row in rows {
            match self.compound_id_conditions(row, false) {
                Ok(conditions) => groups.push(conditions),
                Err(err) => {
                    self.defect(err);
                    return self;
                }
            }
        }
        self.wheres.push(Condition::AnyOf { groups });
        self
    }

    // ==================== Any-of tuples ====================

    fn any_of(mut self, rows: &[Vec<(&str, Value)>], op_for: impl Fn(&str) -> CompareOp) -> Self {
        let groups = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(column, value)| Condition::Compare {
                        column: (*column).to_string(),
                        op: op_for(column),
                        value: value.clone(),
                    })
                    .collect()
            })
            .collect();
        self.wheres.push(Condition::AnyOf { groups });
        self
    }

    /// Match any of the supplied column tuples: each row compiles to an
    /// AND-group and the rows are OR-joined.
    pub fn where_any_is(self, rows: &[Vec<(&str, Value)>]) -> Self {
        self.any_of(rows, |_| CompareOp::Eq)
    }

    /// [`QueryBuilder::where_any_is`] with one operator applied to every
    /// column.
    pub fn where_any_is_with_op(mut self, rows: &[Vec<(&str, Value)>], op: &str) -> Self {
        match CompareOp::parse(op) {
            Some(op) => self.any_of(rows, move |_| op),
            None => {
                self.defect(OrmError::validation(format!("unsupported operator '{op}'")));
                self
            }
        }
    }

    /// [`QueryBuilder::where_any_is`] with a per-column operator map;
    /// unlisted columns default to `=`.
    pub fn where_any_is_with_ops(
        mut self,
        rows: &[Vec<(&str, Value)>],
        ops: &[(&str, &str)],
    ) -> Self {
        let mut parsed = Vec::with_capacity(ops.len());
        for (column, op) in ops {
            match CompareOp::parse(op) {
                Some(op) => parsed.push(((*column).to_string(), op)),
                None => {
                    self.defect(OrmError::validation(format!("unsupported operator '{op}'")));
                    return self;
                }
            }
        }
        self.any_of(rows, move |column| {
            parsed
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, op)| *op)
                .unwrap_or(CompareOp::Eq)
        })
    }

    // ==================== GROUP BY / HAVING ====================

    /// Add a `GROUP BY` column.
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(GroupExpr::Column(column.to_string()));
        self
    }

    /// Add a raw `GROUP BY` expression, emitted verbatim.
    pub fn group_by_expr(mut self, expr: &str) -> Self {
        self.group_by.push(GroupExpr::Expr(expr.to_string()));
        self
    }

    fn push_having(mut self, column: &str, op: CompareOp, value: Value) -> Self {
        let cond = self.simple_condition(column, op, value);
        self.havings.push(cond);
        self
    }

    /// Add `HAVING column = ?`.
    pub fn having_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_having(column, CompareOp::Eq, value.into())
    }

    /// Add `HAVING column != ?`.
    pub fn having_not_equal(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_having(column, CompareOp::Ne, value.into())
    }

    /// Add `HAVING column < ?`.
    pub fn having_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_having(column, CompareOp::Lt, value.into())
    }

    /// Add `HAVING column <= ?`.
    pub fn having_lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_having(column, CompareOp::Lte, value.into())
    }

    /// Add `HAVING column > ?`.
    pub fn having_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_having(column, CompareOp::Gt, value.into())
    }

    /// Add `HAVING column >= ?`.
    pub fn having_gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.push_having(column, CompareOp::Gte, value.into())
    }

    /// Add `HAVING column LIKE ?`.
    pub fn having_like(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.push_having(column, CompareOp::Like, pattern.into())
    }

    /// Add `HAVING column NOT LIKE ?`.
    pub fn having_not_like(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.push_having(column, CompareOp::NotLike, pattern.into())
    }

    /// Add `HAVING column IN (?, ...)`.
    pub fn having_in(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.havings.push(Condition::InList {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        });
        self
    }

    /// Add `HAVING column NOT IN (?, ...)`.
    pub fn having_not_in(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.havings.push(Condition::InList {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        });
        self
    }

    /// Add `HAVING column IS NULL`.
    pub fn having_null(mut self, column: &str) -> Self {
        self.havings.push(Condition::NullCheck {
            column: column.to_string(),
            is_null: true,
        });
        self
    }

    /// Add `HAVING column IS NOT NULL`.
    pub fn having_not_null(mut self, column: &str) -> Self {
        self.havings.push(Condition::NullCheck {
            column: column.to_string(),
            is_null: false,
        });
        self
    }

    /// Add a raw HAVING fragment with its own parameters.
    pub fn having_raw(mut self, sql: &str, params: Vec<Value>) -> Self {
        let expected = count_placeholders(sql);
        if expected != params.len() {
            self.defect(OrmError::malformed_clause(sql, expected, params.len()));
        }
        self.havings.push(Condition::Raw {
            sql: sql.to_string(),
            params,
        });
        self
    }

    // ==================== Ordering & shaping ====================

    /// Add `ORDER BY column ASC`.
    pub fn order_by_asc(mut self, column: &str) -> Self {
        self.orders.push(OrderSpec::Asc(column.to_string()));
        self
    }

    /// Add `ORDER BY column DESC`.
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.orders.push(OrderSpec::Desc(column.to_string()));
        self
    }

    /// Add a raw `ORDER BY` expression, emitted verbatim.
    pub fn order_by_expr(mut self, expr: &str) -> Self {
        self.orders.push(OrderSpec::Expr(expr.to_string()));
        self
    }

    /// Set `LIMIT`.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set `OFFSET`.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Alias the main table in FROM and in join-qualified columns.
    pub fn table_alias(mut self, alias: &str) -> Self {
        self.table_alias = Some(alias.to_string());
        self
    }

    // ==================== Raw statement override ====================

    /// Replace the whole statement with literal SQL. The text must not
    /// reference any `?` placeholders, since no parameters are supplied.
    pub fn raw_query(mut self, sql: &str) -> Self {
        let expected = count_placeholders(sql);
        if expected != 0 {
            self.defect(OrmError::malformed_clause(sql, expected, 0));
        }
        self.raw_statement = Some((sql.to_string(), ParamList::new()));
        self
    }

    /// Replace the whole statement with literal SQL and positional
    /// parameters; the `?` count must match.
    pub fn raw_query_params(mut self, sql: &str, params: Vec<Value>) -> Self {
        let expected = count_placeholders(sql);
        if expected != params.len() {
            self.defect(OrmError::malformed_clause(sql, expected, params.len()));
        }
        self.raw_statement = Some((sql.to_string(), ParamList::from(params)));
        self
    }

    /// Replace the whole statement with literal SQL using named `:name`
    /// placeholders. Keys may be given with or without the leading colon and
    /// are not validated against the text.
    pub fn raw_query_named(mut self, sql: &str, params: &[(&str, Value)]) -> Self {
        let mut list = ParamList::new();
        for (name, value) in params {
            let key = format!(":{}", name.trim_start_matches(':'));
            list.push_named(key, value.clone());
        }
        self.raw_statement = Some((sql.to_string(), list));
        self
    }

    // ==================== Compilation ====================

    /// Compile the current state into `(sql, params)` without executing.
    ///
    /// Compiling the same frozen state twice yields identical output.
    pub fn compile(&self) -> OrmResult<(String, ParamList)> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        if let Some((sql, params)) = &self.raw_statement {
            return Ok((sql.clone(), params.clone()));
        }

        let dialect = self.session.dialect();
        let mut params = ParamList::new();
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let cols: Vec<String> = self.columns.iter().map(|c| c.build(dialect)).collect();
            sql.push_str(&cols.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&dialect.quote(&self.table));
        if let Some(alias) = &self.table_alias {
            sql.push(' ');
            sql.push_str(&dialect.quote(alias));
        }
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.build(dialect, &mut params));
        }
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&build_clause_list(&self.wheres, dialect, &mut params));
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            let parts: Vec<String> = self
                .group_by
                .iter()
                .map(|g| match g {
                    GroupExpr::Column(column) => dialect.quote(column),
                    GroupExpr::Expr(expr) => expr.clone(),
                })
                .collect();
            sql.push_str(&parts.join(", "));
        }
        if !self.havings.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&build_clause_list(&self.havings, dialect, &mut params));
        }
        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            let parts: Vec<String> = self
                .orders
                .iter()
                .map(|o| match o {
                    OrderSpec::Asc(column) => format!("{} ASC", dialect.quote(column)),
                    OrderSpec::Desc(column) => format!("{} DESC", dialect.quote(column)),
                    OrderSpec::Expr(expr) => expr.clone(),
                })
                .collect();
            sql.push_str(&parts.join(", "));
        }
        if let Some(n) = self.limit {
            let _ = write!(sql, " LIMIT {n}");
        }
        if let Some(n) = self.offset {
            let _ = write!(sql, " OFFSET {n}");
        }
        Ok((sql, params))
    }

    /// The compiled SQL text, for inspection.
    pub fn to_sql(&self) -> OrmResult<String> {
        Ok(self.compile()?.0)
    }

    fn run_select(&self) -> OrmResult<RowSet> {
        let (sql, params) = self.compile()?;
        self.session.run(&sql, &params)
    }

    fn into_record(&self, row: crate::client::Row) -> Record<'s> {
        Record::from_row(
            self.session,
            self.table.clone(),
            self.id_columns.clone(),
            row,
        )
    }

    // ==================== Terminals ====================

    /// Fetch all matching rows as records.
    pub fn find_many(self) -> OrmResult<Vec<Record<'s>>> {
        let rows = self.run_select()?;
        Ok(rows.into_iter().map(|row| self.into_record(row)).collect())
    }

    /// Fetch all matching rows as plain row maps.
    pub fn find_array(self) -> OrmResult<RowSet> {
        self.run_select()
    }

    /// Fetch a single row, appending `LIMIT 1` unless a limit is already set.
    pub fn find_one(mut self) -> OrmResult<Option<Record<'s>>> {
        if self.limit.is_none() {
            self.limit = Some(1);
        }
        let rows = self.run_select()?;
        Ok(rows.into_iter().next().map(|row| self.into_record(row)))
    }

    /// Primary-key lookup: the id equality is AND-ed ahead of any
    /// previously-added WHERE clauses.
    pub fn find_one_by(mut self, id: impl Into<Value>) -> OrmResult<Option<Record<'s>>> {
        if let Some(column) = self.single_id_column() {
            let cond = self.simple_condition(&column, CompareOp::Eq, id.into());
            self.wheres.insert(0, cond);
        }
        self.find_one()
    }

    /// Compound primary-key lookup; `row` must contain every declared id
    /// column, extra keys are ignored.
    pub fn find_one_by_compound(mut self, row: &[(&str, Value)]) -> OrmResult<Option<Record<'s>>> {
        match self.compound_id_conditions(row, true) {
            Ok(conditions) => {
                for (i, cond) in conditions.into_iter().enumerate() {
                    self.wheres.insert(i, cond);
                }
            }
            Err(err) => self.defect(err),
        }
        self.find_one()
    }

    /// Create a fresh unsaved record bound to this table and id spec.
    pub fn create(self) -> Record<'s> {
        Record::new_unsaved(self.session, self.table, self.id_columns)
    }

    /// Delete every row matching the WHERE list.
    pub fn delete_many(self) -> OrmResult<()> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        let dialect = self.session.dialect();
        let mut params = ParamList::new();
        let mut sql = format!("DELETE FROM {}", dialect.quote(&self.table));
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&build_clause_list(&self.wheres, dialect, &mut params));
        }
        self.session.run(&sql, &params)?;
        Ok(())
    }

    // ==================== Aggregates ====================

    fn aggregate(mut self, func: &str, column: Option<&str>, alias: &str) -> OrmResult<Option<Value>> {
        let dialect = self.session.dialect();
        let target = match column {
            Some(column) => dialect.quote(column),
            None => "*".to_string(),
        };
        // Aggregates discard any previously selected columns.
        self.columns = vec![ResultColumn::ExprAlias {
            expr: format!("{func}({target})"),
            alias: alias.to_string(),
        }];
        if self.limit.is_none() {
            self.limit = Some(1);
        }
        let rows = self.run_select()?;
        Ok(rows.into_iter().next().and_then(|row| row.get(alias).cloned()))
    }

    /// `SELECT COUNT(*) AS \`count\``; 0 when the executor returns no row.
    pub fn count(self) -> OrmResult<i64> {
        let value = self.aggregate("COUNT", None, "count")?;
        Ok(value.and_then(|v| v.as_int()).unwrap_or(0))
    }

    /// `SELECT MIN(\`column\`) AS \`min\``.
    pub fn min(self, column: &str) -> OrmResult<Option<Value>> {
        self.aggregate("MIN", Some(column), "min")
    }

    /// `SELECT MAX(\`column\`) AS \`max\``.
    pub fn max(self, column: &str) -> OrmResult<Option<Value>> {
        self.aggregate("MAX", Some(column), "max")
    }

    /// `SELECT AVG(\`column\`) AS \`avg\``.
    pub fn avg(self, column: &str) -> OrmResult<Option<Value>> {
        self.aggregate("AVG", Some(column), "avg")
    }

    /// `SELECT SUM(\`column\`) AS \`sum\``.
    pub fn sum(self, column: &str) -> OrmResult<Option<Value>> {
        self.aggregate("SUM", Some(column), "sum")
    }
}
