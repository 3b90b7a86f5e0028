pub mod sqlite3;

pub use self::sqlite3::Sqlite3Driver;
