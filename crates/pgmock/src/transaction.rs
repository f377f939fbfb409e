//! Transaction support.
//!
//! This module provides PostgreSQL transaction options and the transaction
//! handle returned by [`MockConn::begin`](crate::PgConnection::begin).

use std::fmt;

use async_trait::async_trait;
use pgmock_types::{PgValue, ToSql};

use crate::conn::MockConn;
use crate::driver::{Executor, PgTransaction};
use crate::error::Result;
use crate::kind::CallKind;
use crate::result::CommandTag;
use crate::rows::Rows;
use crate::statement::StatementDescription;

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Read uncommitted. PostgreSQL treats it as read committed.
    ReadUncommitted,

    /// Read committed (default for PostgreSQL).
    ///
    /// Each statement sees only data committed before it began.
    #[default]
    ReadCommitted,

    /// Repeatable read.
    ///
    /// All statements of the transaction see the snapshot taken at its
    /// first statement.
    RepeatableRead,

    /// Serializable (highest isolation).
    ///
    /// Transactions behave as if run one after another; conflicting
    /// transactions fail with SQLSTATE `40001`.
    Serializable,
}

impl IsolationLevel {
    /// Get the SQL statement to set this isolation level.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "SET TRANSACTION ISOLATION LEVEL READ UNCOMMITTED",
            Self::ReadCommitted => "SET TRANSACTION ISOLATION LEVEL READ COMMITTED",
            Self::RepeatableRead => "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ",
            Self::Serializable => "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE",
        }
    }

    /// Get the isolation level name as used in PostgreSQL.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Reads and writes allowed.
    #[default]
    ReadWrite,
    /// Writes are rejected.
    ReadOnly,
}

impl AccessMode {
    /// Get the access mode as used in PostgreSQL.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadWrite => "READ WRITE",
            Self::ReadOnly => "READ ONLY",
        }
    }
}

/// Options for starting a transaction.
///
/// An unset field means the server default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions {
    /// Isolation level.
    pub isolation: Option<IsolationLevel>,
    /// Access mode.
    pub access_mode: Option<AccessMode>,
    /// Whether the transaction is deferrable.
    pub deferrable: bool,
}

impl TxOptions {
    /// Create options with server defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the isolation level.
    #[must_use]
    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    /// Set the access mode.
    #[must_use]
    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = Some(mode);
        self
    }

    /// Shortcut for a read-only transaction.
    #[must_use]
    pub fn read_only(self) -> Self {
        self.access_mode(AccessMode::ReadOnly)
    }

    /// Mark the transaction deferrable.
    #[must_use]
    pub fn deferrable(mut self, deferrable: bool) -> Self {
        self.deferrable = deferrable;
        self
    }

    /// The `BEGIN` statement a real driver would send for these options.
    #[must_use]
    pub fn begin_sql(&self) -> String {
        let mut sql = String::from("BEGIN");
        if let Some(level) = self.isolation {
            sql.push_str(" ISOLATION LEVEL ");
            sql.push_str(level.name());
        }
        if let Some(mode) = self.access_mode {
            sql.push(' ');
            sql.push_str(mode.name());
        }
        if self.deferrable {
            sql.push_str(" DEFERRABLE");
        }
        sql
    }
}

impl fmt::Display for TxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.begin_sql())
    }
}

/// A transaction on a mock connection.
///
/// Statements issued through the transaction are matched against the same
/// expectation list as the connection. The transaction must be finished with
/// [`commit`](PgTransaction::commit) or [`rollback`](PgTransaction::rollback);
/// dropping it unfinished logs a warning, since a real connection would roll
/// it back implicitly.
pub struct MockTransaction {
    conn: MockConn,
    id: u64,
    options: TxOptions,
    finished: bool,
}

impl MockTransaction {
    pub(crate) fn new(conn: MockConn, id: u64, options: TxOptions) -> Self {
        tracing::debug!(transaction_id = id, options = %options, "transaction started");
        Self {
            conn,
            id,
            options,
            finished: false,
        }
    }

    /// Connection-unique transaction id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The options the transaction was started with.
    #[must_use]
    pub fn options(&self) -> TxOptions {
        self.options
    }

    /// The connection this transaction runs on.
    #[must_use]
    pub fn conn(&self) -> &MockConn {
        &self.conn
    }

    async fn finish(mut self, kind: CallKind) -> Result<()> {
        self.finished = true;
        let result = self.conn.run_simple(kind).await;
        tracing::debug!(
            transaction_id = self.id,
            outcome = kind.name(),
            ok = result.is_ok(),
            "transaction finished"
        );
        result
    }
}

impl fmt::Debug for MockTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransaction")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Drop for MockTransaction {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                transaction_id = self.id,
                "transaction dropped without commit or rollback"
            );
        }
    }
}

#[async_trait]
impl Executor for MockTransaction {
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<CommandTag> {
        self.conn.execute(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Rows> {
        self.conn.query(sql, params).await
    }

    async fn prepare(&self, name: &str, sql: &str) -> Result<StatementDescription> {
        self.conn.prepare(name, sql).await
    }

    async fn copy_from(&self, table: &str, columns: &[&str], rows: Vec<Vec<PgValue>>) -> Result<u64> {
        self.conn.copy_from(table, columns, rows).await
    }
}

#[async_trait]
impl PgTransaction for MockTransaction {
    async fn commit(self) -> Result<()> {
        self.finish(CallKind::Commit).await
    }

    async fn rollback(self) -> Result<()> {
        self.finish(CallKind::Rollback).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_level_sql() {
        assert_eq!(
            IsolationLevel::ReadCommitted.as_sql(),
            "SET TRANSACTION ISOLATION LEVEL READ COMMITTED"
        );
        assert_eq!(IsolationLevel::Serializable.name(), "SERIALIZABLE");
    }

    #[test]
    fn test_default_isolation_level() {
        assert_eq!(IsolationLevel::default(), IsolationLevel::ReadCommitted);
    }

    #[test]
    fn test_begin_sql() {
        assert_eq!(TxOptions::new().begin_sql(), "BEGIN");
        let opts = TxOptions::new()
            .isolation(IsolationLevel::Serializable)
            .read_only()
            .deferrable(true);
        assert_eq!(
            opts.begin_sql(),
            "BEGIN ISOLATION LEVEL SERIALIZABLE READ ONLY DEFERRABLE"
        );
    }
}
