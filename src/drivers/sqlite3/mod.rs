//! The SQLite driver.

mod classic;
mod connection;
mod statement;

use std::collections::HashMap;

use crate::config::DRIVER_NAME;
use crate::engine;
use crate::error::{Result, Sqlite3Error};
use crate::traits::{ClassicResultSet, DatabaseConnection, DatabaseDriver};
use crate::types::{Fetched, SqlValue};

pub use self::classic::ResultSet;
pub use self::connection::Connection;
pub use self::statement::{Statement, StatementState};

/// Driver registered under the `sqlite3` scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite3Driver;

impl DatabaseDriver for Sqlite3Driver {
    type Connection = Connection;

    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn open(&self, url: &str) -> Result<Connection> {
        Connection::open(url)
    }

    fn version(&self) -> Result<HashMap<String, String>> {
        version()
    }
}

/// Engine version information under the keys `version`,
/// `sqlite3.versionnumber` and `sqlite3.sourceid`.
pub fn version() -> Result<HashMap<String, String>> {
    let mut data = HashMap::new();
    data.insert("version".to_string(), engine::library_version());
    data.insert(
        "sqlite3.versionnumber".to_string(),
        engine::library_version_number().to_string(),
    );
    data.insert("sqlite3.sourceid".to_string(), engine::library_source_id());
    Ok(data)
}

impl DatabaseConnection for Connection {
    type Statement<'c> = Statement<'c> where Self: 'c;
    type ResultSet<'s> = ResultSet<'s> where Self: 's;

    fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        Connection::prepare(self, sql)
    }

    fn execute<'s, 'c: 's>(
        &'s self,
        statement: &'s mut Statement<'c>,
        params: &[SqlValue],
    ) -> Result<ResultSet<'s>>
    where
        Self: 'c,
    {
        Connection::execute(self, statement, params)
    }

    fn error(&self) -> Sqlite3Error {
        Connection::error(self)
    }

    fn close(self) -> Result<()> {
        Connection::close(self)
    }
}

impl ClassicResultSet for ResultSet<'_> {
    fn more(&self) -> bool {
        ResultSet::more(self)
    }

    fn fetch(&mut self) -> Fetched {
        ResultSet::fetch(self)
    }

    fn close(&mut self) -> Result<()> {
        ResultSet::close(self)
    }

    fn names(&self) -> Vec<String> {
        ResultSet::names(self)
    }

    fn types(&self) -> Vec<Option<String>> {
        ResultSet::types(self)
    }
}
