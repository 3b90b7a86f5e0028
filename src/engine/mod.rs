//! Thin owning wrapper over the SQLite C API.
//!
//! Everything here is a mechanical translation of a C call: statuses come back
//! as raw result codes and no decisions are made about them. Policy (cleanup
//! after errors, flag negotiation, state tracking) lives in
//! [`crate::drivers::sqlite3`].
//!
//! Positions passed into this module are zero-based; the one-based engine
//! convention never leaks out.

mod connection;
mod flags;
mod statement;

use std::ffi::{c_char, c_int, CStr};
use std::sync::OnceLock;

use rusqlite::ffi;

use crate::error::{Result, Sqlite3Error};

pub(crate) use self::connection::{ConnectionLock, RawConnection};
pub use self::flags::OpenFlags;
pub(crate) use self::statement::{RawStatement, Step};

/// Engine result code for success.
pub const OK: c_int = ffi::SQLITE_OK;

/// Version where `sqlite3_sourceid()` first appeared.
const SOURCE_ID_VERSION: i32 = 3_006_018;

/// Version where `sqlite3_extended_errcode()` first appeared.
pub(crate) const EXTENDED_ERRCODE_VERSION: i32 = 3_006_005;

static SERIALIZED: OnceLock<c_int> = OnceLock::new();

/// Switch the engine into serialized threading mode.
///
/// Must run before the engine initializes itself, which happens on the first
/// `open`. Only the first call reaches the engine; later calls return the
/// cached outcome, so this is safe to call from every `open`.
///
/// If something else in the process initialized the engine first, the mode
/// can no longer be changed. That is accepted as long as the library was
/// built with mutexes, since every handle is opened with
/// `SQLITE_OPEN_FULLMUTEX` anyway.
pub fn initialize() -> Result<()> {
    let rc = *SERIALIZED.get_or_init(|| {
        // SAFETY: sqlite3_config is safe to call before sqlite3_initialize;
        // afterwards it returns SQLITE_MISUSE instead of changing anything.
        let rc = unsafe { ffi::sqlite3_config(ffi::SQLITE_CONFIG_SERIALIZED) };
        tracing::debug!(rc, "configured sqlite3 threading mode");
        accept_configured(rc, threadsafe())
    });
    if rc == OK {
        Ok(())
    } else {
        Err(Sqlite3Error::Initialization { code: rc })
    }
}

fn accept_configured(rc: c_int, threadsafe: bool) -> c_int {
    if rc == ffi::SQLITE_MISUSE && threadsafe {
        tracing::debug!("sqlite3 already initialized, relying on per-connection mutexes");
        return OK;
    }
    rc
}

/// True unless the library was compiled without any mutexes.
pub fn threadsafe() -> bool {
    // SAFETY: reads a compile-time setting.
    unsafe { ffi::sqlite3_threadsafe() != 0 }
}

/// The library version string, e.g. `3.45.1`.
pub fn library_version() -> String {
    // SAFETY: returns a pointer to a static string constant.
    let ptr = unsafe { ffi::sqlite3_libversion() };
    fatal_str(ptr, "can't get library version")
}

/// The library version as an integer, e.g. `3045001`.
pub fn library_version_number() -> i32 {
    // SAFETY: no arguments, no state.
    unsafe { ffi::sqlite3_libversion_number() }
}

/// The check-in identifier of the library build.
pub fn library_source_id() -> String {
    if library_version_number() < SOURCE_ID_VERSION {
        return "unknown source id".to_string();
    }
    // SAFETY: returns a pointer to a static string constant.
    let ptr = unsafe { ffi::sqlite3_sourceid() };
    fatal_str(ptr, "can't get library sourceid")
}

/// English description of a result code, for failures with no handle to ask.
pub fn error_string(code: c_int) -> String {
    // SAFETY: sqlite3_errstr accepts any code and returns a static string.
    let ptr = unsafe { ffi::sqlite3_errstr(code) };
    fatal_str(ptr, "can't get error string")
}

/// Converts a zero-based position into the engine's one-based slot.
///
/// Out-of-range positions saturate so the engine reports `SQLITE_RANGE`
/// instead of us wrapping around.
fn slot(position: usize) -> c_int {
    c_int::try_from(position)
        .ok()
        .and_then(|p| p.checked_add(1))
        .unwrap_or(c_int::MAX)
}

/// Converts a zero-based column index for column accessors.
fn column(index: usize) -> c_int {
    c_int::try_from(index).unwrap_or(c_int::MAX)
}

/// Copies a C string that the engine guarantees to be non-null.
///
/// A null here means the native library is broken; there is nothing to
/// recover.
fn fatal_str(ptr: *const c_char, what: &str) -> String {
    if ptr.is_null() {
        panic!("sqlite3 fatal error: {what}!");
    }
    // SAFETY: non-null, NUL-terminated, owned by the engine for the duration
    // of this call.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Copies a C string that may legitimately be null.
fn optional_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: as above.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}
