use std::ffi::{c_int, CString};

use rusqlite::ffi;

use crate::config::{ConnectionConfig, DEFAULT_BUSY_TIMEOUT_MS};
use crate::engine::{self, ConnectionLock, RawConnection, OK};
use crate::error::{Result, Sqlite3Error};

use super::Statement;

/// An open SQLite connection.
///
/// Every connection runs with serialized threading, a 16 second busy timeout
/// and extended result codes; none of these can be turned off.
pub struct Connection {
    raw: RawConnection,
    config: ConnectionConfig,
}

// SAFETY: every handle is opened with SQLITE_OPEN_FULLMUTEX, so the engine
// serializes all calls made through it. Reads of the connection's error slot
// happen under the same mutex, see `Connection::lock`.
unsafe impl Send for Connection {}
unsafe impl Sync for Connection {}

impl Connection {
    /// Open a connection from a URL such as `sqlite3:///tmp/app.db?flags=6`.
    pub fn open(url: &str) -> Result<Self> {
        Self::open_with(ConnectionConfig::parse(url)?)
    }

    /// Open a connection from an already built config.
    pub fn open_with(config: ConnectionConfig) -> Result<Self> {
        engine::initialize()?;

        let name = CString::new(config.name())?;
        let vfs = config.vfs_name().map(CString::new).transpose()?;
        let flags = config.open_flags();

        let (raw, rc) = RawConnection::open(&name, flags.bits(), vfs.as_deref());
        let Some(raw) = raw else {
            // no handle means the engine could not even allocate one
            return Err(Sqlite3Error::from_code(rc));
        };
        let connection = Self { raw, config };

        if rc != OK {
            return Err(connection.abandon());
        }
        if connection.raw.busy_timeout(DEFAULT_BUSY_TIMEOUT_MS) != OK {
            return Err(connection.abandon());
        }
        if connection.raw.extended_result_codes(true) != OK {
            return Err(connection.abandon());
        }

        tracing::debug!(
            name = connection.config.name(),
            flags = flags.bits(),
            vfs = connection.config.vfs_name(),
            "opened sqlite3 connection"
        );
        Ok(connection)
    }

    /// Capture the current error, then let drop close the handle.
    fn abandon(self) -> Sqlite3Error {
        let error = self.error();
        drop(self);
        error
    }

    /// Compile the first SQL statement in `sql`.
    ///
    /// Anything after the first statement is ignored.
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        check_sql_length(sql.len())?;

        let _lock = self.lock();
        let (raw, rc, consumed) = self.raw.prepare(sql);

        if rc != OK {
            let error = self.error();
            if let Some(mut raw) = raw {
                let rc = raw.finalize();
                if rc != OK {
                    tracing::warn!(rc, %error, "finalize failed after prepare error");
                }
            }
            return Err(error);
        }

        let Some(raw) = raw else {
            return Err(Sqlite3Error::EmptyStatement);
        };

        let rest = sql.get(consumed..).unwrap_or_default().trim();
        if !rest.is_empty() {
            tracing::debug!(ignored = rest, "trailing SQL after first statement");
        }

        Ok(Statement::new(self, raw))
    }

    /// The engine's current error for this connection.
    ///
    /// When the connection is shared between threads this is whatever failed
    /// last on any of them; the errors returned by `prepare`, `execute` and
    /// `fetch` always belong to the call that returned them.
    pub fn error(&self) -> Sqlite3Error {
        let _lock = self.lock();
        Sqlite3Error::Engine {
            code: self.raw.error_code(),
            extended_code: self.raw.extended_error_code(),
            message: self.raw.error_message(),
        }
    }

    /// Hold the connection mutex so a failing engine call and the error read
    /// after it see the same error.
    pub(super) fn lock(&self) -> ConnectionLock<'_> {
        self.raw.lock()
    }

    #[cfg(test)]
    pub(super) fn set_limit(&self, id: c_int, value: c_int) -> c_int {
        self.raw.set_limit(id, value)
    }

    /// Rows modified by the most recent INSERT, UPDATE or DELETE.
    pub fn changes(&self) -> i32 {
        self.raw.changes()
    }

    /// Rowid of the most recent successful INSERT.
    pub fn last_insert_rowid(&self) -> i64 {
        self.raw.last_insert_rowid()
    }

    /// The config this connection was opened with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Close the connection.
    ///
    /// Statements borrow their connection, so by the time this can be called
    /// all of them have been finalized.
    pub fn close(mut self) -> Result<()> {
        if self.raw.close() == OK {
            tracing::debug!(name = self.config.name(), "closed sqlite3 connection");
            Ok(())
        } else {
            Err(self.error())
        }
    }
}

/// Reject SQL the engine's prepare cannot take in one call.
fn check_sql_length(len: usize) -> Result<()> {
    if c_int::try_from(len).is_err() {
        return Err(Sqlite3Error::from_code(ffi::SQLITE_TOOBIG));
    }
    Ok(())
}

impl Drop for Connection {
    fn drop(&mut self) {
        let rc = self.raw.close();
        if rc != OK {
            tracing::warn!(
                rc,
                message = %self.raw.error_message(),
                name = self.config.name(),
                "failed to close sqlite3 connection"
            );
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
