use std::ffi::c_int;

use bitflags::bitflags;
use rusqlite::ffi;

bitflags! {
    /// Flags passed to `sqlite3_open_v2`.
    ///
    /// Several of these only mean something to a custom VFS. Whatever the
    /// caller asks for, connections are always opened with `FULL_MUTEX` and
    /// never with `NO_MUTEX`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: c_int {
        const READ_ONLY = ffi::SQLITE_OPEN_READONLY;
        const READ_WRITE = ffi::SQLITE_OPEN_READWRITE;
        const CREATE = ffi::SQLITE_OPEN_CREATE;
        const DELETE_ON_CLOSE = ffi::SQLITE_OPEN_DELETEONCLOSE;
        const EXCLUSIVE = ffi::SQLITE_OPEN_EXCLUSIVE;
        const URI = ffi::SQLITE_OPEN_URI;
        const MEMORY = ffi::SQLITE_OPEN_MEMORY;
        const MAIN_DB = ffi::SQLITE_OPEN_MAIN_DB;
        const TEMP_DB = ffi::SQLITE_OPEN_TEMP_DB;
        const TRANSIENT_DB = ffi::SQLITE_OPEN_TRANSIENT_DB;
        const MAIN_JOURNAL = ffi::SQLITE_OPEN_MAIN_JOURNAL;
        const TEMP_JOURNAL = ffi::SQLITE_OPEN_TEMP_JOURNAL;
        const SUB_JOURNAL = ffi::SQLITE_OPEN_SUBJOURNAL;
        const SUPER_JOURNAL = ffi::SQLITE_OPEN_SUPER_JOURNAL;
        const NO_MUTEX = ffi::SQLITE_OPEN_NOMUTEX;
        const FULL_MUTEX = ffi::SQLITE_OPEN_FULLMUTEX;
        const SHARED_CACHE = ffi::SQLITE_OPEN_SHAREDCACHE;
        const PRIVATE_CACHE = ffi::SQLITE_OPEN_PRIVATECACHE;
    }
}

impl OpenFlags {
    /// Applies the driver's mandatory adjustments to caller-supplied flags.
    ///
    /// Serialized access is forced, and a missing access mode becomes
    /// read-write with create.
    pub fn negotiate(self) -> Self {
        let mut flags = self;
        flags.remove(OpenFlags::NO_MUTEX);
        flags.insert(OpenFlags::FULL_MUTEX);
        if !flags.intersects(OpenFlags::READ_ONLY | OpenFlags::READ_WRITE) {
            flags.insert(OpenFlags::READ_WRITE | OpenFlags::CREATE);
        }
        flags
    }
}
