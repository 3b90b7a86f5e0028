//! Classic execution: bind parameters, step, and read rows one at a time.
//!
//! ```text
//! Idle --execute--> Bound --step--> Active (row)   --fetch...--> Idle
//!                     |               Done         ------------> Idle
//!                     +--bind error / step error ---------------> Idle
//! ```
//!
//! Every terminal outcome clears the statement, so a failed execution never
//! leaves it unusable.

use std::ffi::c_int;

use crate::engine::{RawStatement, Step, OK};
use crate::error::{Result, Sqlite3Error};
use crate::types::{ColumnType, Fetched, Row, SqlValue};

use super::statement::{StatementHandle, StatementState};
use super::{Connection, Statement};

impl Connection {
    /// Bind `params` to `statement` by position and run it to its first row.
    ///
    /// A result set is returned whether or not the statement produces rows;
    /// check [`ResultSet::more`] before fetching. On error the statement is
    /// left clean and can be executed again.
    pub fn execute<'s>(
        &'s self,
        statement: &'s mut Statement<'_>,
        params: &[SqlValue],
    ) -> Result<ResultSet<'s>> {
        if !statement.belongs_to(self) {
            return Err(Sqlite3Error::ForeignStatement);
        }

        let handle = statement.handle_mut();
        if handle.state != StatementState::Idle {
            return Err(Sqlite3Error::StatementBusy);
        }
        if params.len() != handle.parameter_count() {
            return Err(Sqlite3Error::ParameterCount {
                expected: handle.parameter_count(),
                actual: params.len(),
            });
        }

        let _lock = self.lock();
        handle.state = StatementState::Bound;
        for (position, param) in params.iter().enumerate() {
            if bind(&mut handle.raw, position, param) != OK {
                let error = self.error();
                handle.clear();
                return Err(error);
            }
        }

        match handle.raw.step() {
            Step::Row => {
                handle.state = StatementState::Active;
                Ok(ResultSet::new(self, handle, true))
            }
            Step::Done => {
                handle.clear();
                Ok(ResultSet::new(self, handle, false))
            }
            Step::Failed(rc) => {
                let error = self.error();
                tracing::debug!(rc, %error, "execute failed");
                handle.clear();
                Err(error)
            }
        }
    }
}

fn bind(raw: &mut RawStatement, position: usize, value: &SqlValue) -> c_int {
    match value {
        SqlValue::Null => raw.bind_null(position),
        SqlValue::Integer(v) => raw.bind_integer(position, *v),
        SqlValue::Float(v) => raw.bind_float(position, *v),
        SqlValue::Text(v) => raw.bind_text(position, v),
        SqlValue::Blob(v) => raw.bind_blob(position, v),
    }
}

/// Forward-only cursor over the rows of one execution.
///
/// Holds the statement exclusively until dropped; dropping it early resets the
/// statement.
pub struct ResultSet<'s> {
    connection: &'s Connection,
    statement: &'s mut StatementHandle,
    more: bool,
    pending: Option<Sqlite3Error>,
}

impl<'s> ResultSet<'s> {
    fn new(connection: &'s Connection, statement: &'s mut StatementHandle, more: bool) -> Self {
        Self {
            connection,
            statement,
            more,
            pending: None,
        }
    }

    /// True while another [`fetch`](Self::fetch) will return a row.
    pub fn more(&self) -> bool {
        self.more
    }

    /// Read the current row and step to the next one.
    ///
    /// If stepping fails, the row that was read is still returned, with the
    /// error attached, and the result set ends.
    pub fn fetch(&mut self) -> Fetched {
        if !self.more {
            return Fetched::failed(Sqlite3Error::NoMoreRows);
        }

        let connection = self.connection;
        let _lock = connection.lock();
        let raw = &self.statement.raw;
        let columns = raw.column_count();
        if columns == 0 {
            self.finish();
            return Fetched::failed(Sqlite3Error::NoColumns);
        }

        let mut values = Vec::with_capacity(columns);
        let mut types = Vec::with_capacity(columns);
        for i in 0..columns {
            types.push(ColumnType::from_code(raw.column_type(i)));
            values.push(raw.column_text(i));
        }
        let row = Row::new(values, types);

        match self.statement.raw.step() {
            Step::Row => Fetched::row(row),
            Step::Done => {
                self.finish();
                Fetched::row(row)
            }
            Step::Failed(rc) => {
                let error = connection.error();
                tracing::debug!(rc, %error, "step failed during fetch");
                self.finish();
                Fetched::row_with_error(row, error)
            }
        }
    }

    /// Stop reading and reset the statement. Does nothing once exhausted.
    pub fn close(&mut self) -> Result<()> {
        if self.more {
            self.finish();
        }
        Ok(())
    }

    /// Result column names.
    pub fn names(&self) -> Vec<String> {
        let raw = &self.statement.raw;
        (0..raw.column_count()).map(|i| raw.column_name(i)).collect()
    }

    /// Declared result column types; `None` where a column is an expression.
    pub fn types(&self) -> Vec<Option<String>> {
        let raw = &self.statement.raw;
        (0..raw.column_count())
            .map(|i| raw.column_declared_type(i))
            .collect()
    }

    fn finish(&mut self) {
        self.more = false;
        self.statement.clear();
    }
}

impl Iterator for ResultSet<'_> {
    type Item = Result<Row>;

    /// Yields rows until exhausted. An error raised while advancing past a
    /// row is yielded after that row.
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.pending.take() {
            return Some(Err(error));
        }
        if !self.more {
            return None;
        }
        match self.fetch().into_parts() {
            (Some(row), Some(error)) => {
                self.pending = Some(error);
                Some(Ok(row))
            }
            (Some(row), None) => Some(Ok(row)),
            (None, Some(error)) => Some(Err(error)),
            (None, None) => None,
        }
    }
}

impl Drop for ResultSet<'_> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for ResultSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("more", &self.more)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::ffi;

    use super::*;

    #[test]
    fn test_bind_error_clears_statement() {
        let conn = Connection::open(":memory:").unwrap();
        let mut create = conn.prepare("CREATE TABLE t (a TEXT)").unwrap();
        conn.execute(&mut create, &[]).unwrap();
        drop(create);

        let mut insert = conn.prepare("INSERT INTO t VALUES (?)").unwrap();
        conn.set_limit(ffi::SQLITE_LIMIT_LENGTH, 64);

        let err = conn
            .execute(&mut insert, &[SqlValue::from("x".repeat(100))])
            .unwrap_err();
        assert_eq!(err.code(), Some(ffi::SQLITE_TOOBIG), "{err}");
        assert_eq!(insert.state(), StatementState::Idle);

        let rs = conn.execute(&mut insert, &[SqlValue::from("short")]).unwrap();
        assert!(!rs.more());
        drop(rs);
        assert_eq!(conn.changes(), 1);
        assert_eq!(insert.state(), StatementState::Idle);
    }
}
