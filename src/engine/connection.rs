use std::ffi::{c_int, CStr};
use std::marker::PhantomData;
use std::ptr;

use rusqlite::ffi;

use super::{fatal_str, RawStatement, EXTENDED_ERRCODE_VERSION, OK};

/// Owning handle for a `sqlite3*`.
///
/// The handle is closed on drop. `close` may be called any number of times;
/// after a successful close the handle is null and further calls are no-ops.
pub(crate) struct RawConnection {
    handle: *mut ffi::sqlite3,
}

impl RawConnection {
    /// `sqlite3_open_v2`.
    ///
    /// The engine may hand back a handle even when the open fails so the error
    /// message can be read from it, so both are returned.
    pub fn open(name: &CStr, flags: c_int, vfs: Option<&CStr>) -> (Option<Self>, c_int) {
        let mut handle = ptr::null_mut();
        let vfs = vfs.map_or(ptr::null(), CStr::as_ptr);
        // SAFETY: name and vfs are valid NUL-terminated strings (or null for
        // the default vfs) that outlive the call.
        let rc = unsafe { ffi::sqlite3_open_v2(name.as_ptr(), &mut handle, flags, vfs) };
        if handle.is_null() {
            (None, rc)
        } else {
            (Some(Self { handle }), rc)
        }
    }

    /// `sqlite3_close`. Fails with `SQLITE_BUSY` while statements are live.
    pub fn close(&mut self) -> c_int {
        if self.handle.is_null() {
            return OK;
        }
        // SAFETY: handle is a live connection.
        let rc = unsafe { ffi::sqlite3_close(self.handle) };
        if rc == OK {
            self.handle = ptr::null_mut();
        }
        rc
    }

    /// `sqlite3_prepare_v2` on the first statement in `sql`.
    ///
    /// Returns the statement handle (if any), the status, and the byte offset
    /// where the unparsed remainder of `sql` starts.
    pub fn prepare(&self, sql: &str) -> (Option<RawStatement>, c_int, usize) {
        let Ok(len) = c_int::try_from(sql.len()) else {
            return (None, ffi::SQLITE_TOOBIG, 0);
        };
        let mut stmt = ptr::null_mut();
        let mut tail = ptr::null();
        // SAFETY: sql points to len valid bytes; with an explicit length the
        // engine does not require NUL termination.
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(
                self.handle,
                sql.as_ptr().cast(),
                len,
                &mut stmt,
                &mut tail,
            )
        };
        let consumed = if tail.is_null() {
            sql.len()
        } else {
            // SAFETY: tail points into the buffer we passed in.
            let offset = unsafe { tail.cast::<u8>().offset_from(sql.as_ptr()) };
            usize::try_from(offset).unwrap_or(sql.len())
        };
        (RawStatement::from_handle(stmt), rc, consumed)
    }

    /// Enter the connection's own mutex until the guard drops.
    ///
    /// The engine keeps a single error slot per connection. Holding this
    /// across a failing call and the reads of that slot keeps another thread
    /// from replacing the error in between. The mutex is recursive, so engine
    /// calls made while it is held enter it again without blocking.
    pub fn lock(&self) -> ConnectionLock<'_> {
        let mutex = if self.handle.is_null() {
            ptr::null_mut()
        } else {
            // SAFETY: handle is a live connection.
            unsafe { ffi::sqlite3_db_mutex(self.handle) }
        };
        // SAFETY: mutex is the connection's mutex, or null when the engine
        // runs without one, in which case enter is a no-op.
        unsafe { ffi::sqlite3_mutex_enter(mutex) };
        ConnectionLock {
            mutex,
            _connection: PhantomData,
        }
    }

    /// `sqlite3_limit`; returns the previous value.
    #[cfg(test)]
    pub fn set_limit(&self, id: c_int, value: c_int) -> c_int {
        // SAFETY: handle is a live connection.
        unsafe { ffi::sqlite3_limit(self.handle, id, value) }
    }

    pub fn busy_timeout(&self, milliseconds: c_int) -> c_int {
        // SAFETY: handle is a live connection.
        unsafe { ffi::sqlite3_busy_timeout(self.handle, milliseconds) }
    }

    pub fn extended_result_codes(&self, on: bool) -> c_int {
        // SAFETY: handle is a live connection.
        unsafe { ffi::sqlite3_extended_result_codes(self.handle, c_int::from(on)) }
    }

    pub fn error_message(&self) -> String {
        // SAFETY: handle is a live connection; the message is owned by it.
        let ptr = unsafe { ffi::sqlite3_errmsg(self.handle) };
        fatal_str(ptr, "can't get error message")
    }

    pub fn error_code(&self) -> c_int {
        // SAFETY: handle is a live connection.
        unsafe { ffi::sqlite3_errcode(self.handle) }
    }

    pub fn extended_error_code(&self) -> c_int {
        if super::library_version_number() < EXTENDED_ERRCODE_VERSION {
            return self.error_code();
        }
        // SAFETY: handle is a live connection.
        unsafe { ffi::sqlite3_extended_errcode(self.handle) }
    }

    pub fn changes(&self) -> i32 {
        // SAFETY: handle is a live connection.
        unsafe { ffi::sqlite3_changes(self.handle) }
    }

    pub fn last_insert_rowid(&self) -> i64 {
        // SAFETY: handle is a live connection.
        unsafe { ffi::sqlite3_last_insert_rowid(self.handle) }
    }
}

/// Guard returned by [`RawConnection::lock`]. Not `Send`: the mutex must be
/// left on the thread that entered it.
pub(crate) struct ConnectionLock<'a> {
    mutex: *mut ffi::sqlite3_mutex,
    _connection: PhantomData<&'a RawConnection>,
}

impl Drop for ConnectionLock<'_> {
    fn drop(&mut self) {
        // SAFETY: entered in RawConnection::lock on this thread.
        unsafe { ffi::sqlite3_mutex_leave(self.mutex) };
    }
}

impl Drop for RawConnection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{initialize, OpenFlags, Step};

    fn open_memory() -> RawConnection {
        initialize().unwrap();
        let flags = OpenFlags::empty().negotiate().bits();
        let (conn, rc) = RawConnection::open(c":memory:", flags, None);
        assert_eq!(rc, OK);
        conn.unwrap()
    }

    #[test]
    fn test_open_and_close_twice() {
        let mut conn = open_memory();
        assert_eq!(conn.close(), OK);
        assert_eq!(conn.close(), OK);
    }

    #[test]
    fn test_open_missing_file_read_only_fails_with_handle() {
        initialize().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        let name = std::ffi::CString::new(path.to_str().unwrap()).unwrap();
        let (conn, rc) = RawConnection::open(&name, OpenFlags::READ_ONLY.bits(), None);
        assert_eq!(rc, ffi::SQLITE_CANTOPEN);
        let conn = conn.expect("engine returns a handle on open failure");
        assert_eq!(conn.error_code(), ffi::SQLITE_CANTOPEN);
        assert!(!conn.error_message().is_empty());
    }

    #[test]
    fn test_open_unknown_vfs_fails() {
        initialize().unwrap();
        let flags = OpenFlags::empty().negotiate().bits();
        let (_conn, rc) = RawConnection::open(c":memory:", flags, Some(c"no-such-vfs"));
        assert_ne!(rc, OK);
    }

    #[test]
    fn test_prepare_reports_tail() {
        let conn = open_memory();
        let sql = "SELECT 1; SELECT 2";
        let (stmt, rc, consumed) = conn.prepare(sql);
        assert_eq!(rc, OK);
        assert!(stmt.is_some());
        assert_eq!(sql[consumed..].trim(), "SELECT 2");
    }

    #[test]
    fn test_prepare_syntax_error() {
        let conn = open_memory();
        let (stmt, rc, _) = conn.prepare("SELEC 1");
        assert_eq!(rc, ffi::SQLITE_ERROR);
        assert!(stmt.is_none());
        assert!(conn.error_message().contains("syntax error"));
    }

    #[test]
    fn test_lock_is_reentrant() {
        let conn = open_memory();
        let _outer = conn.lock();
        let _inner = conn.lock();
        let (stmt, rc, _) = conn.prepare("SELEC 1");
        assert_eq!(rc, ffi::SQLITE_ERROR);
        assert!(stmt.is_none());
        assert_eq!(conn.error_code(), ffi::SQLITE_ERROR);
    }

    #[test]
    fn test_lock_after_close() {
        let mut conn = open_memory();
        assert_eq!(conn.close(), OK);
        drop(conn.lock());
    }

    #[test]
    fn test_changes_and_rowid() {
        let conn = open_memory();
        for sql in ["CREATE TABLE t (a)", "INSERT INTO t VALUES (1)"] {
            let (stmt, rc, _) = conn.prepare(sql);
            assert_eq!(rc, OK);
            assert_eq!(stmt.unwrap().step(), Step::Done);
        }
        assert_eq!(conn.changes(), 1);
        assert_eq!(conn.last_insert_rowid(), 1);
    }
}
