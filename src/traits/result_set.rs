use crate::error::Result;
use crate::types::Fetched;

/// A forward-only, single-pass cursor over result rows.
///
/// Check [`more`](ClassicResultSet::more) before every
/// [`fetch`](ClassicResultSet::fetch): a statement that produced no rows still
/// yields a result set, and fetching from it is an error.
pub trait ClassicResultSet {
    /// True while another fetch will produce a row.
    fn more(&self) -> bool;

    /// Read the current row and advance.
    fn fetch(&mut self) -> Fetched;

    /// Stop reading early. Safe to call more than once.
    fn close(&mut self) -> Result<()>;

    /// Column names, in order. Empty if the statement has no result columns.
    fn names(&self) -> Vec<String>;

    /// Declared column types, in order. `None` for expression columns.
    fn types(&self) -> Vec<Option<String>>;
}
