//! Typed row filters for find and delete.
//!
//! Values are always bound as parameters; only column names end up in the
//! SQL text, and those are quoted.

use rusqlite::types::Value as SqlValue;

use crate::error::Result;
use crate::record::SqlField;
use crate::table::quote_ident;

/// Conjunction of column equality tests. The empty condition matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    clauses: Vec<(String, SqlValue)>,
}

impl Condition {
    /// Match every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match rows where `column = value`.
    pub fn eq(column: impl Into<String>, value: impl SqlField) -> Self {
        Self::all().and_eq(column, value)
    }

    /// Add another equality test.
    pub fn and_eq(mut self, column: impl Into<String>, value: impl SqlField) -> Self {
        self.clauses.push((column.into(), value.to_sql_value()));
        self
    }

    pub fn is_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Compile into a `WHERE` fragment (empty for [`Condition::all`]) and its
    /// bound parameters.
    pub(crate) fn compile(&self) -> Result<(String, Vec<SqlValue>)> {
        if self.clauses.is_empty() {
            return Ok((String::new(), Vec::new()));
        }
        let mut tests = Vec::with_capacity(self.clauses.len());
        let mut params = Vec::with_capacity(self.clauses.len());
        for (column, value) in &self.clauses {
            tests.push(format!("{} = ?", quote_ident(column)?));
            params.push(value.clone());
        }
        Ok((format!("WHERE {}", tests.join(" AND ")), params))
    }
}
