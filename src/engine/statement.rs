use std::ffi::{c_int, c_uchar};
use std::ptr;
use std::slice;

use rusqlite::ffi;

use super::{column, fatal_str, optional_str, slot, OK};

/// Outcome of one `sqlite3_step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// A result row is available.
    Row,
    /// The statement has run to completion.
    Done,
    /// Anything else: an error, busy, or misuse status.
    Failed(c_int),
}

/// Owning handle for a `sqlite3_stmt*`, finalized on drop.
pub(crate) struct RawStatement {
    handle: *mut ffi::sqlite3_stmt,
}

impl RawStatement {
    pub(super) fn from_handle(handle: *mut ffi::sqlite3_stmt) -> Option<Self> {
        if handle.is_null() {
            None
        } else {
            Some(Self { handle })
        }
    }

    /// `sqlite3_finalize`. Safe to call more than once.
    pub fn finalize(&mut self) -> c_int {
        if self.handle.is_null() {
            return OK;
        }
        // SAFETY: handle is a live statement; it is never used again.
        let rc = unsafe { ffi::sqlite3_finalize(self.handle) };
        self.handle = ptr::null_mut();
        rc
    }

    pub fn reset(&mut self) -> c_int {
        // SAFETY: handle is a live statement.
        unsafe { ffi::sqlite3_reset(self.handle) }
    }

    pub fn clear_bindings(&mut self) -> c_int {
        // SAFETY: handle is a live statement.
        unsafe { ffi::sqlite3_clear_bindings(self.handle) }
    }

    pub fn sql(&self) -> String {
        // SAFETY: handle is a live statement created by prepare_v2.
        let ptr = unsafe { ffi::sqlite3_sql(self.handle) };
        fatal_str(ptr, "can't get SQL statement")
    }

    pub fn bind_parameter_count(&self) -> usize {
        // SAFETY: handle is a live statement.
        let count = unsafe { ffi::sqlite3_bind_parameter_count(self.handle) };
        usize::try_from(count).unwrap_or(0)
    }

    pub fn bind_integer(&mut self, position: usize, value: i64) -> c_int {
        // SAFETY: handle is a live statement; bad slots yield SQLITE_RANGE.
        unsafe { ffi::sqlite3_bind_int64(self.handle, slot(position), value) }
    }

    pub fn bind_float(&mut self, position: usize, value: f64) -> c_int {
        // SAFETY: as above.
        unsafe { ffi::sqlite3_bind_double(self.handle, slot(position), value) }
    }

    pub fn bind_text(&mut self, position: usize, value: &str) -> c_int {
        // SAFETY: value is valid for value.len() bytes and SQLITE_TRANSIENT
        // makes the engine take its own copy before returning.
        unsafe {
            ffi::sqlite3_bind_text64(
                self.handle,
                slot(position),
                value.as_ptr().cast(),
                value.len() as ffi::sqlite3_uint64,
                ffi::SQLITE_TRANSIENT(),
                ffi::SQLITE_UTF8 as c_uchar,
            )
        }
    }

    pub fn bind_blob(&mut self, position: usize, value: &[u8]) -> c_int {
        // SAFETY: as for bind_text.
        unsafe {
            ffi::sqlite3_bind_blob64(
                self.handle,
                slot(position),
                value.as_ptr().cast(),
                value.len() as ffi::sqlite3_uint64,
                ffi::SQLITE_TRANSIENT(),
            )
        }
    }

    pub fn bind_null(&mut self, position: usize) -> c_int {
        // SAFETY: handle is a live statement.
        unsafe { ffi::sqlite3_bind_null(self.handle, slot(position)) }
    }

    pub fn step(&mut self) -> Step {
        // SAFETY: handle is a live statement.
        match unsafe { ffi::sqlite3_step(self.handle) } {
            ffi::SQLITE_ROW => Step::Row,
            ffi::SQLITE_DONE => Step::Done,
            rc => Step::Failed(rc),
        }
    }

    pub fn column_count(&self) -> usize {
        // SAFETY: handle is a live statement.
        let count = unsafe { ffi::sqlite3_column_count(self.handle) };
        usize::try_from(count).unwrap_or(0)
    }

    /// Storage class code (`SQLITE_INTEGER` ... `SQLITE_NULL`) of a column in
    /// the current row.
    pub fn column_type(&self, index: usize) -> c_int {
        // SAFETY: handle is a live statement positioned on a row.
        unsafe { ffi::sqlite3_column_type(self.handle, column(index)) }
    }

    pub fn column_name(&self, index: usize) -> String {
        // SAFETY: handle is a live statement.
        let ptr = unsafe { ffi::sqlite3_column_name(self.handle, column(index)) };
        fatal_str(ptr, "can't get column name")
    }

    /// Text rendering of a column in the current row, `None` for NULL.
    pub fn column_text(&self, index: usize) -> Option<String> {
        let index = column(index);
        // SAFETY: handle is a live statement positioned on a row. The text
        // pointer stays valid until the next step/reset/finalize, and
        // column_bytes must be called after column_text to measure it.
        unsafe {
            let ptr = ffi::sqlite3_column_text(self.handle, index);
            if ptr.is_null() {
                return None;
            }
            let len = usize::try_from(ffi::sqlite3_column_bytes(self.handle, index)).unwrap_or(0);
            let bytes = slice::from_raw_parts(ptr, len);
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    /// Declared type of a result column; `None` for expressions.
    pub fn column_declared_type(&self, index: usize) -> Option<String> {
        // SAFETY: handle is a live statement.
        let ptr = unsafe { ffi::sqlite3_column_decltype(self.handle, column(index)) };
        optional_str(ptr)
    }
}

impl Drop for RawStatement {
    fn drop(&mut self) {
        let _ = self.finalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{initialize, OpenFlags, RawConnection};

    fn open_memory() -> RawConnection {
        initialize().unwrap();
        let flags = OpenFlags::empty().negotiate().bits();
        let (conn, rc) = RawConnection::open(c":memory:", flags, None);
        assert_eq!(rc, OK);
        conn.unwrap()
    }

    fn prepare(conn: &RawConnection, sql: &str) -> RawStatement {
        let (stmt, rc, _) = conn.prepare(sql);
        assert_eq!(rc, OK, "{}", conn.error_message());
        stmt.unwrap()
    }

    #[test]
    fn test_bind_positions_are_zero_based() {
        let conn = open_memory();
        let mut stmt = prepare(&conn, "SELECT ?, ?, ?, ?, ?");
        assert_eq!(stmt.bind_parameter_count(), 5);
        assert_eq!(stmt.bind_integer(0, 42), OK);
        assert_eq!(stmt.bind_float(1, 1.5), OK);
        assert_eq!(stmt.bind_text(2, "héllo"), OK);
        assert_eq!(stmt.bind_blob(3, b"ab"), OK);
        assert_eq!(stmt.bind_null(4), OK);
        assert_eq!(stmt.bind_integer(5, 1), ffi::SQLITE_RANGE);

        assert_eq!(stmt.step(), Step::Row);
        assert_eq!(stmt.column_count(), 5);
        assert_eq!(stmt.column_type(0), ffi::SQLITE_INTEGER);
        assert_eq!(stmt.column_text(0).as_deref(), Some("42"));
        assert_eq!(stmt.column_type(1), ffi::SQLITE_FLOAT);
        assert_eq!(stmt.column_text(1).as_deref(), Some("1.5"));
        assert_eq!(stmt.column_text(2).as_deref(), Some("héllo"));
        assert_eq!(stmt.column_type(3), ffi::SQLITE_BLOB);
        assert_eq!(stmt.column_text(3).as_deref(), Some("ab"));
        assert_eq!(stmt.column_type(4), ffi::SQLITE_NULL);
        assert_eq!(stmt.column_text(4), None);
        assert_eq!(stmt.step(), Step::Done);
    }

    #[test]
    fn test_column_metadata() {
        let conn = open_memory();
        let mut create = prepare(&conn, "CREATE TABLE t (a INTEGER, b VARCHAR(10))");
        assert_eq!(create.step(), Step::Done);

        let stmt = prepare(&conn, "SELECT a, b, a + 1 AS c FROM t");
        assert_eq!(stmt.column_name(0), "a");
        assert_eq!(stmt.column_name(2), "c");
        assert_eq!(stmt.column_declared_type(0).as_deref(), Some("INTEGER"));
        assert_eq!(stmt.column_declared_type(1).as_deref(), Some("VARCHAR(10)"));
        assert_eq!(stmt.column_declared_type(2), None);
        assert_eq!(stmt.sql(), "SELECT a, b, a + 1 AS c FROM t");
    }

    #[test]
    fn test_reset_allows_rerun() {
        let conn = open_memory();
        let mut stmt = prepare(&conn, "SELECT ?");
        assert_eq!(stmt.bind_integer(0, 7), OK);
        assert_eq!(stmt.step(), Step::Row);
        assert_eq!(stmt.clear_bindings(), OK);
        assert_eq!(stmt.reset(), OK);
        assert_eq!(stmt.step(), Step::Row);
        assert_eq!(stmt.column_text(0), None);
    }

    #[test]
    fn test_finalize_twice() {
        let conn = open_memory();
        let mut stmt = prepare(&conn, "SELECT 1");
        assert_eq!(stmt.finalize(), OK);
        assert_eq!(stmt.finalize(), OK);
    }
}
