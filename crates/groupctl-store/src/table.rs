use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};

use crate::condition::Condition;
use crate::error::{Result, StoreError};
use crate::record::{ColumnDef, Record};

/// SQLite-backed table store.
///
/// Each table holds one record shape; the caller picks the table name. A
/// single connection is shared behind a mutex, so statements from different
/// threads run one at a time.
#[derive(Debug)]
pub struct TableStore {
    conn: Mutex<Connection>,
}

impl TableStore {
    /// Open (or create) a database at the given path, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Io(format!("create {}: {}", parent.display(), e))
                })?;
            }
        }
        let conn =
            Connection::open(path).map_err(|e| StoreError::Database(format!("open: {}", e)))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|e| StoreError::Database(format!("journal_mode: {}", e)))?;
        tracing::debug!("opened table store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Database(format!("open_in_memory: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the guard leaves no partial state behind:
        // every statement is a single execute.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the table for `R` unless it already exists.
    pub fn create<R: Record>(&self, table: &str) -> Result<()> {
        let sql = create_table_sql(table, &R::columns())?;
        tracing::trace!(%sql, "create");
        self.conn().execute(&sql, [])?;
        Ok(())
    }

    /// Column names of the live table.
    pub fn columns(&self, table: &str) -> Result<Vec<String>> {
        let quoted = quote_ident(table)?;
        live_columns(&self.conn(), &quoted)
    }

    /// Insert a row. Fails with [`StoreError::AlreadyExists`] when the
    /// primary key is taken.
    pub fn insert<R: Record>(&self, table: &str, record: &R) -> Result<()> {
        self.write(table, record, "INSERT")
    }

    /// Insert a row, replacing any row with the same primary key.
    pub fn upsert<R: Record>(&self, table: &str, record: &R) -> Result<()> {
        self.write(table, record, "INSERT OR REPLACE")
    }

    fn write<R: Record>(&self, table: &str, record: &R, verb: &str) -> Result<()> {
        let quoted = quote_ident(table)?;
        let conn = self.conn();

        // Column list comes from the table, not the record, so a record that
        // drifted from the stored shape is caught here.
        let columns = live_columns(&conn, &quoted)?;
        let values = record.values();
        if columns.len() != values.len() {
            return Err(StoreError::ColumnMismatch {
                expected: columns.len(),
                found: values.len(),
            });
        }

        let column_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!("{verb} INTO {quoted} ({column_list}) VALUES ({placeholders})");
        tracing::trace!(%sql, "write");

        let mut stmt = conn.prepare(&sql)?;
        stmt.execute(params_from_iter(values.iter())).map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return StoreError::AlreadyExists(table.to_string());
                }
            }
            StoreError::Database(format!("{}: {}", verb.to_lowercase(), e))
        })?;
        Ok(())
    }

    /// Scan every matching row into `record`; the last match wins.
    ///
    /// Returns whether any row matched. When none did, or the matching row
    /// fails to decode, `record` is untouched.
    pub fn find_into<R: Record>(
        &self,
        table: &str,
        record: &mut R,
        condition: &Condition,
    ) -> Result<bool> {
        let mut last = None;
        self.scan(table, condition, |values| {
            last = Some(values);
            Ok(())
        })?;
        match last {
            Some(values) => {
                record.assign(values)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Find the (last) matching row, or `None` if no row matched.
    pub fn find<R: Record + Default>(
        &self,
        table: &str,
        condition: &Condition,
    ) -> Result<Option<R>> {
        let mut record = R::default();
        if self.find_into(table, &mut record, condition)? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    /// Every matching row, in table order.
    pub fn find_all<R: Record + Default>(
        &self,
        table: &str,
        condition: &Condition,
    ) -> Result<Vec<R>> {
        let mut records = Vec::new();
        self.scan(table, condition, |values| {
            let mut record = R::default();
            record.assign(values)?;
            records.push(record);
            Ok(())
        })?;
        Ok(records)
    }

    fn scan<F>(&self, table: &str, condition: &Condition, mut visit: F) -> Result<()>
    where
        F: FnMut(Vec<SqlValue>) -> Result<()>,
    {
        let quoted = quote_ident(table)?;
        let (where_clause, params) = condition.compile()?;
        let sql = format!("SELECT * FROM {quoted} {where_clause}");
        let sql = sql.trim_end();
        tracing::trace!(%sql, "scan");

        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let values = (0..width)
                .map(|i| row.get::<_, SqlValue>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            visit(values)?;
        }
        Ok(())
    }

    /// Delete matching rows. Returns the number of rows removed.
    pub fn delete(&self, table: &str, condition: &Condition) -> Result<usize> {
        let quoted = quote_ident(table)?;
        let (where_clause, params) = condition.compile()?;
        let sql = format!("DELETE FROM {quoted} {where_clause}");
        let sql = sql.trim_end();
        tracing::trace!(%sql, "delete");
        let removed = self.conn().execute(sql, params_from_iter(params.iter()))?;
        Ok(removed)
    }

    /// Number of rows in the table.
    pub fn count(&self, table: &str) -> Result<usize> {
        let quoted = quote_ident(table)?;
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT * FROM {quoted}"))?;
        let mut rows = stmt.query([])?;
        let mut count = 0;
        while rows.next()?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

fn live_columns(conn: &Connection, quoted_table: &str) -> Result<Vec<String>> {
    let stmt = conn.prepare(&format!("SELECT * FROM {quoted_table} LIMIT 0"))?;
    Ok(stmt.column_names().into_iter().map(String::from).collect())
}

/// Quote a table or column name for interpolation into SQL.
pub(crate) fn quote_ident(name: &str) -> Result<String> {
    if name.trim().is_empty() || name.contains('\0') {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// `CREATE TABLE IF NOT EXISTS` statement for a record descriptor.
pub fn create_table_sql(table: &str, columns: &[ColumnDef]) -> Result<String> {
    if columns.is_empty() {
        return Err(StoreError::EmptyRecord);
    }
    let mut defs = Vec::with_capacity(columns.len());
    for column in columns {
        let constraint = if column.primary_key {
            "PRIMARY KEY NOT NULL"
        } else {
            "NULL"
        };
        defs.push(format!(
            "{} {} {}",
            quote_ident(&column.name)?,
            column.sql_type,
            constraint
        ));
    }
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table)?,
        defs.join(", ")
    ))
}
