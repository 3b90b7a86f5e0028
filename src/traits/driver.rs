use std::collections::HashMap;

use crate::error::Result;
use crate::traits::DatabaseConnection;

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Turning a connection URL into an open connection
/// - Reporting version information about themselves and their engine
pub trait DatabaseDriver {
    /// The connection type this driver opens.
    type Connection: DatabaseConnection;

    /// The URL scheme this driver is registered under.
    fn name(&self) -> &'static str;

    /// Open a connection described by `url`.
    fn open(&self, url: &str) -> Result<Self::Connection>;

    /// Key/value version information. Always contains a `version` key.
    fn version(&self) -> Result<HashMap<String, String>>;
}
