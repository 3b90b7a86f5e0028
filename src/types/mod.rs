mod row;
mod sql_value;

pub use row::{ColumnType, Fetched, Row};
pub use sql_value::SqlValue;
