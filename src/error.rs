use std::ffi::NulError;

use rusqlite::ffi;
use thiserror::Error;

/// Error type for sqlite3rs operations
#[derive(Debug, Error)]
pub enum Sqlite3Error {
    #[error("Open: {0}")]
    InvalidUrl(String),

    #[error("Open: name contains a NUL byte: {0}")]
    NulByte(#[from] NulError),

    #[error("Initialize: can't switch engine to serialized mode (code {code})")]
    Initialization { code: i32 },

    #[error("Prepare: no SQL statement found")]
    EmptyStatement,

    #[error("Execute: statement belongs to a different connection")]
    ForeignStatement,

    #[error("Execute: statement still has an active result set")]
    StatementBusy,

    #[error("Execute: number of parameters doesn't match (expected {expected}, got {actual})")]
    ParameterCount { expected: usize, actual: usize },

    #[error("Fetch: no result to fetch")]
    NoMoreRows,

    #[error("Fetch: no columns in result")]
    NoColumns,

    #[error("{message} (code {code}, extended code {extended_code})")]
    Engine {
        code: i32,
        extended_code: i32,
        message: String,
    },
}

impl Sqlite3Error {
    /// An engine error built from a bare result code, for failures where
    /// there is no connection to ask for a message.
    pub fn from_code(code: i32) -> Self {
        Sqlite3Error::Engine {
            code,
            extended_code: code,
            message: crate::engine::error_string(code),
        }
    }

    /// Returns the primary engine result code, if this is an engine error.
    pub fn code(&self) -> Option<i32> {
        match self {
            Sqlite3Error::Engine { code, .. } => Some(code & 0xff),
            _ => None,
        }
    }

    /// Returns the extended engine result code, if this is an engine error.
    pub fn extended_code(&self) -> Option<i32> {
        match self {
            Sqlite3Error::Engine { extended_code, .. } => Some(*extended_code),
            _ => None,
        }
    }

    /// True if the engine gave up waiting on a locked database.
    pub fn is_busy(&self) -> bool {
        matches!(self.code(), Some(ffi::SQLITE_BUSY) | Some(ffi::SQLITE_LOCKED))
    }

    /// True for constraint violations (UNIQUE, NOT NULL, CHECK, ...).
    pub fn is_constraint(&self) -> bool {
        self.code() == Some(ffi::SQLITE_CONSTRAINT)
    }

    /// True for errors raised by the driver itself rather than the engine.
    pub fn is_usage(&self) -> bool {
        !matches!(
            self,
            Sqlite3Error::Engine { .. } | Sqlite3Error::Initialization { .. }
        )
    }
}

/// Result type alias for sqlite3rs operations
pub type Result<T> = std::result::Result<T, Sqlite3Error>;
