//! Session context: configuration, executor handle, and query log.
//!
//! A [`Session`] replaces the kind of process-wide registry older builders use
//! for "current connection" state: it owns the dialect configuration, the
//! [`Executor`] handle, and the last-statement [`QueryLog`], and builders are
//! created from it. One session models one logical connection; share it across
//! threads only with external serialization of compiles, since concurrent
//! statements would interleave in the log.

use crate::client::{Executor, RowSet};
use crate::error::OrmResult;
use crate::ident::Dialect;
use crate::qb::{ParamList, QueryBuilder};
use std::sync::Mutex;

/// Session configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Identifier-quoting dialect.
    pub dialect: Dialect,
    /// Whether executed statements are recorded in the query log.
    pub logging: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Mysql,
            logging: true,
        }
    }
}

/// Last-executed-statement record.
///
/// Holds at most one `(sql, params)` pair, overwritten on every successful
/// compile-and-execute and cleared on demand. A failed compile never reaches
/// the log, so the previous entry survives it.
#[derive(Debug, Default)]
pub struct QueryLog {
    last: Mutex<Option<(String, ParamList)>>,
}

impl QueryLog {
    // The stored pair is always replaced whole, so a poisoned lock holds a
    // consistent entry and the guard can be recovered.
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(String, ParamList)>> {
        self.last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, sql: &str, params: &ParamList) {
        *self.lock() = Some((sql.to_string(), params.clone()));
    }

    fn clear(&self) {
        *self.lock() = None;
    }

    /// The last statement: the SQL text, followed by a space and the parameter
    /// dump when parameters were bound.
    fn render(&self) -> Option<String> {
        self.lock().as_ref().map(|(sql, params)| {
            if params.is_empty() {
                sql.clone()
            } else {
                format!("{sql} {}", params.dump())
            }
        })
    }
}

/// Owner of one logical connection's builder state.
pub struct Session {
    config: SessionConfig,
    executor: Box<dyn Executor>,
    log: QueryLog,
}

impl Session {
    /// Create a session with the default configuration.
    pub fn new(executor: impl Executor + 'static) -> Self {
        Self::with_config(executor, SessionConfig::default())
    }

    /// Create a session with an explicit configuration.
    pub fn with_config(executor: impl Executor + 'static, config: SessionConfig) -> Self {
        Self {
            config,
            executor: Box::new(executor),
            log: QueryLog::default(),
        }
    }

    /// The session's quoting dialect.
    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// Start a query builder for `table`.
    pub fn for_table(&self, table: &str) -> QueryBuilder<'_> {
        QueryBuilder::new(self, table)
    }

    /// The last executed statement, with its parameter dump appended when
    /// parameters were bound. `None` before the first statement or after a
    /// [`Session::clear_last_query`].
    pub fn last_query(&self) -> Option<String> {
        self.log.render()
    }

    /// Reset the query log.
    pub fn clear_last_query(&self) {
        self.log.clear();
    }

    /// Run a compiled statement: log it, then hand it to the executor.
    pub(crate) fn run(&self, sql: &str, params: &ParamList) -> OrmResult<RowSet> {
        tracing::debug!(sql, params = %params.dump(), "executing statement");
        if self.config.logging {
            self.log.record(sql, params);
        }
        self.executor.execute(sql, params)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::sync::Arc;

    #[test]
    fn query_log_keeps_working_after_a_poisoned_lock() {
        let log = Arc::new(QueryLog::default());
        let poisoner = Arc::clone(&log);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.last.lock().unwrap();
            panic!("poison the log lock");
        })
        .join();

        let mut params = ParamList::new();
        params.push(Value::from(5));
        log.record("SELECT * FROM `widget` WHERE `id` = ?", &params);
        assert_eq!(
            log.render(),
            Some("SELECT * FROM `widget` WHERE `id` = ? {0 => 5}".to_string())
        );

        log.clear();
        assert_eq!(log.render(), None);
    }
}
