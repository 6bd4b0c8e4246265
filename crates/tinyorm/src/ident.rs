//! SQL identifier quoting.
//!
//! Identifiers are quoted per dialect: dotted names are split on `.` and each
//! non-empty part is quoted independently (`table.column` becomes
//! `` `table`.`column` ``), a `*` segment is passed through unquoted
//! (`widget.*` becomes `` `widget`.* ``), and embedded quote characters are
//! escaped by doubling. Quoting is total: it cannot fail for any input.
//!
//! Raw expressions supplied through the `_expr`/`_raw` builder operations
//! bypass quoting entirely; the caller owns their correctness.

/// Identifier-quoting dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// Backtick quoting (MySQL, SQLite).
    #[default]
    Mysql,
    /// Double-quote quoting (ANSI SQL, PostgreSQL).
    Ansi,
}

impl Dialect {
    fn quote_char(self) -> char {
        match self {
            Dialect::Mysql => '`',
            Dialect::Ansi => '"',
        }
    }

    /// Quote an identifier, splitting dotted paths into parts.
    pub fn quote(self, identifier: &str) -> String {
        let mut out = String::with_capacity(identifier.len() + 4);
        self.write_quoted(identifier, &mut out);
        out
    }

    pub(crate) fn write_quoted(self, identifier: &str, out: &mut String) {
        for (i, part) in identifier.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }
            self.write_part(part, out);
        }
    }

    /// Quote each member of a compound id-column spec, joined with `, `.
    pub fn quote_columns(self, columns: &[String]) -> String {
        let mut out = String::new();
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_quoted(col, &mut out);
        }
        out
    }

    fn write_part(self, part: &str, out: &mut String) {
        // A wildcard segment and an empty segment stay unquoted.
        if part == "*" || part.is_empty() {
            out.push_str(part);
            return;
        }
        let q = self.quote_char();
        out.push(q);
        for ch in part.chars() {
            if ch == q {
                out.push(q);
                out.push(q);
            } else {
                out.push(ch);
            }
        }
        out.push(q);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_simple_identifier() {
        assert_eq!(Dialect::Mysql.quote("widget"), "`widget`");
    }

    #[test]
    fn quotes_dotted_path_per_part() {
        assert_eq!(Dialect::Mysql.quote("t.c"), "`t`.`c`");
        assert_eq!(Dialect::Mysql.quote("a.b.c"), "`a`.`b`.`c`");
    }

    #[test]
    fn wildcard_segments_stay_unquoted() {
        assert_eq!(Dialect::Mysql.quote("*"), "*");
        assert_eq!(Dialect::Mysql.quote("widget.*"), "`widget`.*");
    }

    #[test]
    fn embedded_quote_char_is_doubled() {
        assert_eq!(Dialect::Mysql.quote("a`b"), "`a``b`");
        assert_eq!(Dialect::Ansi.quote("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn ansi_dialect_uses_double_quotes() {
        assert_eq!(Dialect::Ansi.quote("t.c"), "\"t\".\"c\"");
    }

    #[test]
    fn compound_id_columns_join_with_comma() {
        let cols = vec!["id1".to_string(), "id2".to_string()];
        assert_eq!(Dialect::Mysql.quote_columns(&cols), "`id1`, `id2`");
    }
}
