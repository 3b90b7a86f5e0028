mod connection;
mod driver;
mod result_set;

pub use connection::DatabaseConnection;
pub use driver::DatabaseDriver;
pub use result_set::ClassicResultSet;
