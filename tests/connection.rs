use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use sqlite3rs::{
    params, Connection, ConnectionConfig, DatabaseDriver, OpenFlags, Sqlite3Driver, Sqlite3Error,
};

fn file_url(dir: &tempfile::TempDir, file: &str) -> String {
    dir.path().join(file).to_str().unwrap().to_string()
}

#[test]
fn test_open_creates_missing_file_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    assert!(!path.exists());

    let conn = sqlite3rs::open(path.to_str().unwrap()).unwrap();
    let mut create = conn.prepare("CREATE TABLE t (a)").unwrap();
    conn.execute(&mut create, &[]).unwrap();
    drop(create);
    conn.close().unwrap();

    assert!(path.exists());
}

#[test]
fn test_open_with_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite3://{}", file_url(&dir, "scheme.db"));
    let conn = sqlite3rs::open(&url).unwrap();
    assert!(conn.config().name().ends_with("scheme.db"));
}

#[test]
fn test_open_rejects_foreign_scheme() {
    let err = sqlite3rs::open("postgres://localhost/db").unwrap_err();
    assert!(matches!(err, Sqlite3Error::InvalidUrl(_)));
    assert!(err.is_usage());
}

#[test]
fn test_read_only_flags_from_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = file_url(&dir, "ro.db");
    {
        let conn = sqlite3rs::open(&path).unwrap();
        let mut create = conn.prepare("CREATE TABLE t (a)").unwrap();
        conn.execute(&mut create, &[]).unwrap();
    }

    let url = format!("{path}?flags={}", OpenFlags::READ_ONLY.bits());
    let conn = sqlite3rs::open(&url).unwrap();
    assert!(conn.config().open_flags().contains(OpenFlags::READ_ONLY));
    assert!(conn.config().open_flags().contains(OpenFlags::FULL_MUTEX));

    let mut select = conn.prepare("SELECT count(*) FROM t").unwrap();
    let mut rs = conn.execute(&mut select, &[]).unwrap();
    assert_eq!(rs.fetch().into_result().unwrap().get(0), Some("0"));
    drop(rs);

    let mut insert = conn.prepare("INSERT INTO t VALUES (?)").unwrap();
    let err = conn.execute(&mut insert, &params![1]).unwrap_err();
    assert_eq!(err.code(), Some(rusqlite::ffi::SQLITE_READONLY));
}

#[test]
fn test_no_mutex_flag_is_overridden() {
    let flags = OpenFlags::READ_WRITE | OpenFlags::CREATE | OpenFlags::NO_MUTEX;
    let conn =
        Connection::open_with(ConnectionConfig::new(":memory:").flags(flags)).unwrap();
    let negotiated = conn.config().open_flags();
    assert!(!negotiated.contains(OpenFlags::NO_MUTEX));
    assert!(negotiated.contains(OpenFlags::FULL_MUTEX));
}

#[test]
fn test_open_error_reports_engine_message() {
    let dir = tempfile::tempdir().unwrap();
    let url = dir.path().join("missing").join("x.db");
    let url = url.to_str().unwrap();
    let err = sqlite3rs::open(url).unwrap_err();
    match err {
        Sqlite3Error::Engine { code, message, .. } => {
            assert_eq!(code & 0xff, rusqlite::ffi::SQLITE_CANTOPEN);
            assert!(!message.is_empty());
        }
        other => panic!("expected engine error, got {other:?}"),
    }
}

#[test]
fn test_error_reflects_last_failure() {
    let conn = sqlite3rs::open(":memory:").unwrap();
    assert!(conn.prepare("SELECT * FROM missing").is_err());
    let err = conn.error();
    assert!(err.to_string().contains("no such table: missing"), "{err}");
}

#[test]
fn test_connection_shared_across_threads() {
    let conn = sqlite3rs::open(":memory:").unwrap();
    let mut create = conn.prepare("CREATE TABLE t (a INTEGER)").unwrap();
    conn.execute(&mut create, &[]).unwrap();
    drop(create);

    thread::scope(|scope| {
        for worker in 0..4 {
            let conn = &conn;
            scope.spawn(move || {
                let mut insert = conn.prepare("INSERT INTO t VALUES (?)").unwrap();
                for i in 0..25 {
                    conn.execute(&mut insert, &params![worker * 100 + i]).unwrap();
                }
            });
        }
    });

    let mut count = conn.prepare("SELECT count(*) FROM t").unwrap();
    let mut rs = conn.execute(&mut count, &[]).unwrap();
    assert_eq!(rs.fetch().into_result().unwrap().get(0), Some("100"));
}

#[test]
fn test_errors_stay_with_their_thread() {
    let conn = sqlite3rs::open(":memory:").unwrap();
    let mut create = conn.prepare("CREATE TABLE t (a INTEGER PRIMARY KEY)").unwrap();
    conn.execute(&mut create, &[]).unwrap();
    drop(create);
    let mut insert = conn.prepare("INSERT INTO t VALUES (1)").unwrap();
    conn.execute(&mut insert, &[]).unwrap();

    let stop = AtomicBool::new(false);
    thread::scope(|scope| {
        let conn = &conn;
        let stop = &stop;
        scope.spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let err = conn.prepare("SELEC 1").unwrap_err();
                assert_eq!(err.code(), Some(rusqlite::ffi::SQLITE_ERROR), "{err}");
            }
        });

        for _ in 0..5000 {
            let err = conn.execute(&mut insert, &[]).unwrap_err();
            assert!(err.is_constraint(), "{err}");
            assert!(err.to_string().contains("UNIQUE"), "{err}");
        }
        stop.store(true, Ordering::Relaxed);
    });
}

#[test]
fn test_busy_timeout_is_always_set() {
    let dir = tempfile::tempdir().unwrap();
    for url in [":memory:".to_string(), file_url(&dir, "timeout.db")] {
        let conn = sqlite3rs::open(&url).unwrap();
        let mut pragma = conn.prepare("PRAGMA busy_timeout").unwrap();
        let mut rs = conn.execute(&mut pragma, &[]).unwrap();
        let row = rs.fetch().into_result().unwrap();
        assert_eq!(row.get(0), Some("16000"));
    }
}

#[test]
fn test_driver_trait() {
    let driver = Sqlite3Driver;
    assert_eq!(driver.name(), sqlite3rs::DRIVER_NAME);
    let conn = driver.open(":memory:").unwrap();
    conn.close().unwrap();

    let version = sqlite3rs::version().unwrap();
    assert_eq!(version, driver.version().unwrap());
    assert!(version.contains_key("sqlite3.sourceid"));
}
