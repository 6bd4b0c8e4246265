//! Unified query builder (QB) system for tinyorm.
//!
//! One [`QueryBuilder`] type carries the whole fluent surface: result
//! columns, joins, WHERE/HAVING predicates, grouping, ordering, and row
//! limits, compiled into `(sql, params)` by a terminal call.
//!
//! # Features
//!
//! - **Fixed clause order**: clauses compile in SQL order regardless of the
//!   order the fluent calls were made in
//! - **Positional placeholders**: every bound value becomes a `?` and is
//!   appended to the statement's [`ParamList`] in placeholder order
//! - **Deferred validation**: fluent calls never fail; a malformed raw
//!   fragment surfaces as an error from the terminal call
//!
//! # Usage
//!
//! ```ignore
//! let widgets = session
//!     .for_table("widget")
//!     .where_eq("name", "Fred")
//!     .where_gte("age", 18)
//!     .order_by_desc("id")
//!     .limit(10)
//!     .find_many()?;
//!
//! let (sql, params) = session
//!     .for_table("widget")
//!     .where_in("id", [1, 2, 3])
//!     .compile()?;
//! ```

mod expr;
mod join;
mod param;
mod select;

pub use expr::{CompareOp, Condition};
pub use join::{Join, JoinConstraint, JoinKind, JoinSource};
pub use param::{Param, ParamList};
pub use select::{QueryBuilder, ResultColumn};
