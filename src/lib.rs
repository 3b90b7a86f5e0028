//! sqlite3rs - SQLite behind a small, generic database interface
//!
//! Statements are prepared once and executed many times. Each execution binds
//! its parameters by position, steps the engine once and hands back a
//! forward-only result set that reads one row per call.
//!
//! # Example
//! ```
//! use sqlite3rs::params;
//!
//! let conn = sqlite3rs::open(":memory:")?;
//!
//! let mut create = conn.prepare("CREATE TABLE users (id INTEGER, name TEXT)")?;
//! conn.execute(&mut create, &[])?;
//!
//! let mut insert = conn.prepare("INSERT INTO users VALUES (?, ?)")?;
//! for (id, name) in [(1, "Alice"), (2, "Bob")] {
//!     let rs = conn.execute(&mut insert, &params![id, name])?;
//!     assert!(!rs.more());
//! }
//!
//! let mut select = conn.prepare("SELECT id, name FROM users ORDER BY id")?;
//! let mut rows = conn.execute(&mut select, &[])?;
//! assert_eq!(rows.names(), ["id", "name"]);
//!
//! while rows.more() {
//!     let row = rows.fetch().into_result()?;
//!     println!("{} {}", row.get(0).unwrap_or("NULL"), row.get(1).unwrap_or("NULL"));
//! }
//! # Ok::<_, sqlite3rs::Sqlite3Error>(())
//! ```

pub mod config;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod traits;
pub mod types;

use std::collections::HashMap;

// Re-export main types for convenient access
pub use config::{ConnectionConfig, DEFAULT_BUSY_TIMEOUT_MS, DRIVER_NAME};
pub use drivers::sqlite3::{Connection, ResultSet, Statement, StatementState};
pub use drivers::Sqlite3Driver;
pub use engine::{initialize, OpenFlags};
pub use error::{Result, Sqlite3Error};
pub use traits::{ClassicResultSet, DatabaseConnection, DatabaseDriver};
pub use types::{ColumnType, Fetched, Row, SqlValue};

/// Open a connection described by `url`.
///
/// Accepts a bare path (`app.db`, `:memory:`) or a `sqlite3:` URL, with
/// optional `flags` and `vfs` query options.
pub fn open(url: &str) -> Result<Connection> {
    Connection::open(url)
}

/// Engine version information. See [`drivers::sqlite3::version`].
pub fn version() -> Result<HashMap<String, String>> {
    drivers::sqlite3::version()
}

/// Build a `Vec<SqlValue>` from a list of values convertible into one.
///
/// ```
/// use sqlite3rs::{params, SqlValue};
///
/// let p = params![1, "two", 3.0, None::<i64>];
/// assert_eq!(p[1], SqlValue::Text("two".to_string()));
/// assert_eq!(p[3], SqlValue::Null);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::SqlValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::SqlValue::from($value)),+]
    };
}
