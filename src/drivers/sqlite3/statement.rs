use std::ptr;

use crate::engine::{RawStatement, OK};
use crate::error::Result;

use super::Connection;

/// Where a statement is in its bind/step/reset cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    /// Clean: no bindings, ready to execute.
    Idle,
    /// Parameters are being applied.
    Bound,
    /// Stepped onto a row that a result set has not finished reading.
    Active,
}

/// A prepared statement, reusable across executions.
///
/// Finalized on drop, or explicitly with [`Statement::finalize`].
pub struct Statement<'c> {
    connection: &'c Connection,
    handle: StatementHandle,
}

// SAFETY: see the Send impl on Connection; the statement handle is covered by
// the same connection mutex.
unsafe impl Send for Statement<'_> {}

impl<'c> Statement<'c> {
    pub(super) fn new(connection: &'c Connection, raw: RawStatement) -> Self {
        let handle = StatementHandle {
            sql: raw.sql(),
            parameter_count: raw.bind_parameter_count(),
            raw,
            state: StatementState::Idle,
        };
        Self { connection, handle }
    }

    /// The SQL text this statement was compiled from.
    pub fn sql(&self) -> &str {
        &self.handle.sql
    }

    /// Number of `?` placeholders, fixed at prepare time.
    pub fn parameter_count(&self) -> usize {
        self.handle.parameter_count
    }

    pub fn state(&self) -> StatementState {
        self.handle.state
    }

    /// Clear bindings and rewind, returning the statement to `Idle`.
    ///
    /// Result sets do this themselves when they finish or are dropped; it is
    /// only needed after a result set was leaked.
    pub fn reset(&mut self) {
        self.handle.clear();
    }

    /// Finalize the statement, reporting any failure.
    pub fn finalize(mut self) -> Result<()> {
        let _lock = self.connection.lock();
        if self.handle.raw.finalize() == OK {
            Ok(())
        } else {
            Err(self.connection.error())
        }
    }

    pub(super) fn belongs_to(&self, connection: &Connection) -> bool {
        ptr::eq(self.connection, connection)
    }

    pub(super) fn handle_mut(&mut self) -> &mut StatementHandle {
        &mut self.handle
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.handle.sql)
            .field("parameter_count", &self.handle.parameter_count)
            .field("state", &self.handle.state)
            .finish()
    }
}

/// The part of a statement a result set borrows while it reads rows.
pub(crate) struct StatementHandle {
    pub(super) raw: RawStatement,
    sql: String,
    parameter_count: usize,
    pub(super) state: StatementState,
}

impl StatementHandle {
    pub(super) fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Clear bindings and reset.
    ///
    /// Reset repeats the status of a failed step, which the caller has already
    /// reported, so statuses here are only logged.
    pub(super) fn clear(&mut self) {
        let cleared = self.raw.clear_bindings();
        let reset = self.raw.reset();
        if cleared != OK || reset != OK {
            tracing::debug!(cleared, reset, sql = %self.sql, "statement reset reported an error");
        }
        self.state = StatementState::Idle;
    }
}

impl Drop for StatementHandle {
    fn drop(&mut self) {
        let rc = self.raw.finalize();
        if rc != OK {
            tracing::warn!(rc, sql = %self.sql, "failed to finalize statement");
        }
    }
}
