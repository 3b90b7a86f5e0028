use crate::error::{Result, Sqlite3Error};
use crate::traits::ClassicResultSet;
use crate::types::SqlValue;

/// Trait for an open database connection.
///
/// Statements borrow their connection and result sets borrow their
/// statement, so a connection cannot be closed while statements are alive and
/// a statement cannot be executed again while a result set is still reading
/// from it.
pub trait DatabaseConnection {
    /// A prepared statement bound to a connection borrowed for `'c`.
    type Statement<'c>
    where
        Self: 'c;

    /// Cursor over the rows produced by one execution.
    type ResultSet<'s>: ClassicResultSet
    where
        Self: 's;

    /// Compile `sql` into a reusable statement.
    fn prepare(&self, sql: &str) -> Result<Self::Statement<'_>>;

    /// Bind `params` to the statement by position and start executing it.
    /// The number of parameters must match the statement's placeholders.
    fn execute<'s, 'c: 's>(
        &'s self,
        statement: &'s mut Self::Statement<'c>,
        params: &[SqlValue],
    ) -> Result<Self::ResultSet<'s>>
    where
        Self: 'c;

    /// The most recent error reported by the engine for this connection.
    fn error(&self) -> Sqlite3Error;

    /// Close the connection, reporting any failure.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}
