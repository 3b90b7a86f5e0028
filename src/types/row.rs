use std::ffi::c_int;

use rusqlite::ffi;

use crate::error::{Result, Sqlite3Error};

/// Storage class of a value in a result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Blob,
    Null,
}

impl ColumnType {
    pub(crate) fn from_code(code: c_int) -> Self {
        match code {
            ffi::SQLITE_INTEGER => ColumnType::Integer,
            ffi::SQLITE_FLOAT => ColumnType::Float,
            ffi::SQLITE_BLOB => ColumnType::Blob,
            ffi::SQLITE_NULL => ColumnType::Null,
            _ => ColumnType::Text,
        }
    }
}

/// One row of a result set.
///
/// Every value is held as the engine's text rendering, `None` for NULL,
/// alongside the storage class the engine reported for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Option<String>>,
    types: Vec<ColumnType>,
}

impl Row {
    pub(crate) fn new(values: Vec<Option<String>>, types: Vec<ColumnType>) -> Self {
        debug_assert_eq!(values.len(), types.len());
        Self { values, types }
    }

    /// Gets a value by column position. `None` if the value is NULL or the
    /// position is out of range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Storage class of the value at a column position.
    pub fn column_type(&self, index: usize) -> Option<ColumnType> {
        self.types.get(index).copied()
    }

    /// All values in column order.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Consumes the row, returning its values in column order.
    pub fn into_values(self) -> Vec<Option<String>> {
        self.values
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of a single fetch.
///
/// A fetch can hand back a row *and* an error: the row was read before the
/// engine failed to advance to the next one. Both halves should be checked.
#[derive(Debug)]
pub struct Fetched {
    data: Option<Row>,
    error: Option<Sqlite3Error>,
}

impl Fetched {
    pub(crate) fn row(row: Row) -> Self {
        Self {
            data: Some(row),
            error: None,
        }
    }

    pub(crate) fn failed(error: Sqlite3Error) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    pub(crate) fn row_with_error(row: Row, error: Sqlite3Error) -> Self {
        Self {
            data: Some(row),
            error: Some(error),
        }
    }

    /// The fetched row, if one was read.
    pub fn data(&self) -> Option<&Row> {
        self.data.as_ref()
    }

    /// The error raised by this fetch, if any.
    pub fn error(&self) -> Option<&Sqlite3Error> {
        self.error.as_ref()
    }

    /// True when a row was read and nothing went wrong.
    pub fn is_ok(&self) -> bool {
        self.data.is_some() && self.error.is_none()
    }

    pub fn into_parts(self) -> (Option<Row>, Option<Sqlite3Error>) {
        (self.data, self.error)
    }

    /// Converts into a `Result`, failing if any error was attached.
    /// Use `into_parts` to keep a row that arrived with an error.
    pub fn into_result(self) -> Result<Row> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(row), None) => Ok(row),
            (None, None) => Err(Sqlite3Error::NoMoreRows),
        }
    }
}
