//! # tinyorm
//!
//! A lightweight, dialect-aware SQL statement builder and record mapper.
//!
//! ## Features
//!
//! - **Fluent building**: chainable, order-independent clause methods
//!   compiled into a fixed SQL clause order
//! - **Parameterized output**: every compiled statement is a `(sql, params)`
//!   pair with `?` placeholders; values never appear in the SQL text
//! - **Dialect-aware quoting**: backtick or ANSI double-quote identifier
//!   quoting, selected per session
//! - **Record mapping**: fetched rows become [`Record`]s with dirty-field
//!   tracking; `save` compiles the minimal INSERT or UPDATE
//! - **Pluggable execution**: statements are handed to an [`Executor`]
//!   trait object, so any backend (or a test double) can sit behind a session
//!
//! ## Usage
//!
//! ```ignore
//! use tinyorm::{Session, Value};
//!
//! let session = Session::new(executor);
//!
//! // SELECT
//! let people = session
//!     .for_table("person")
//!     .where_eq("name", "Fred")
//!     .where_gte("age", 18)
//!     .order_by_asc("name")
//!     .find_many()?;
//!
//! // INSERT
//! let mut person = session.for_table("person").create();
//! person.set("name", "Joe").set("age", 10);
//! person.save()?;
//!
//! // UPDATE
//! if let Some(mut person) = session.for_table("person").find_one_by(1)? {
//!     person.set("name", "Bob");
//!     person.save()?;
//! }
//!
//! // DELETE
//! session.for_table("person").where_lt("age", 10).delete_many()?;
//! ```

pub mod client;
pub mod error;
pub mod ident;
pub mod qb;
pub mod record;
pub mod session;
pub mod value;

pub use client::{Executor, Row, RowSet};
pub use error::{OrmError, OrmResult};
pub use ident::Dialect;
pub use record::Record;
pub use session::{Session, SessionConfig};
pub use value::Value;

// Re-export the qb surface for easy access
pub use qb::{CompareOp, JoinConstraint, JoinKind, Param, ParamList, QueryBuilder};
