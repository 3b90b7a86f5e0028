//! Connection configuration and connection-URL parsing.
//!
//! The accepted form is `[sqlite3:[//]]<path>[?flags=<int>&vfs=<name>]`.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::{form_urlencoded, ParseError, Url};

use crate::engine::OpenFlags;
use crate::error::{Result, Sqlite3Error};

/// Scheme accepted in connection URLs.
pub const DRIVER_NAME: &str = "sqlite3";

/// How long the engine retries on a locked database before reporting busy.
pub const DEFAULT_BUSY_TIMEOUT_MS: i32 = 16 * 1000;

const PATH: &AsciiSet = &CONTROLS.add(b' ').add(b'?').add(b'#').add(b'%');

/// Everything needed to open a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    name: String,
    flags: OpenFlags,
    vfs: Option<String>,
}

impl ConnectionConfig {
    /// A config for the given database name with no flags and the default vfs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: OpenFlags::empty(),
            vfs: None,
        }
    }

    /// Set the caller-requested open flags.
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Select a named virtual filesystem.
    pub fn vfs(mut self, vfs: impl Into<String>) -> Self {
        let vfs = vfs.into();
        self.vfs = (!vfs.is_empty()).then_some(vfs);
        self
    }

    /// Parse a connection URL.
    pub fn parse(url: &str) -> Result<Self> {
        let (name, query) = match Url::parse(url) {
            Ok(parsed) => {
                if parsed.scheme() != DRIVER_NAME {
                    return Err(Sqlite3Error::InvalidUrl(format!(
                        "unknown scheme {} expected {}",
                        parsed.scheme(),
                        DRIVER_NAME
                    )));
                }
                let mut name = parsed.host_str().unwrap_or_default().to_string();
                name.push_str(parsed.path());
                (decode(&name)?, parsed.query().map(str::to_string))
            }
            Err(ParseError::RelativeUrlWithoutBase) => match url.split_once('?') {
                Some((path, query)) => (decode(path)?, Some(query.to_string())),
                None => (decode(url)?, None),
            },
            Err(e) => return Err(Sqlite3Error::InvalidUrl(e.to_string())),
        };

        if name.is_empty() {
            return Err(Sqlite3Error::InvalidUrl(
                "no path or database name".to_string(),
            ));
        }

        let mut config = Self::new(name);
        if let Some(query) = query {
            for (key, value) in form_urlencoded::parse(query.as_bytes()) {
                match key.as_ref() {
                    "flags" => {
                        let bits = value.trim().parse::<i32>().map_err(|e| {
                            Sqlite3Error::InvalidUrl(format!("invalid flags {value:?}: {e}"))
                        })?;
                        config.flags = OpenFlags::from_bits_retain(bits);
                    }
                    "vfs" => config = config.vfs(value.into_owned()),
                    other => tracing::debug!(option = other, "ignoring unknown connection option"),
                }
            }
        }
        Ok(config)
    }

    /// The database file name (or `:memory:`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flags as requested, before negotiation.
    pub fn requested_flags(&self) -> OpenFlags {
        self.flags
    }

    /// Flags the connection is actually opened with.
    pub fn open_flags(&self) -> OpenFlags {
        self.flags.negotiate()
    }

    pub fn vfs_name(&self) -> Option<&str> {
        self.vfs.as_deref()
    }

    /// Render this config as a connection URL that parses back to it.
    pub fn url(&self) -> String {
        let name = utf8_percent_encode(&self.name, PATH);
        let mut query = form_urlencoded::Serializer::new(String::new());
        if !self.flags.is_empty() {
            query.append_pair("flags", &self.flags.bits().to_string());
        }
        if let Some(vfs) = &self.vfs {
            query.append_pair("vfs", vfs);
        }
        let query = query.finish();
        if query.is_empty() {
            format!("{DRIVER_NAME}:{name}")
        } else {
            format!("{DRIVER_NAME}:{name}?{query}")
        }
    }
}

fn decode(raw: &str) -> Result<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|e| Sqlite3Error::InvalidUrl(format!("database name is not UTF-8: {e}")))
}
