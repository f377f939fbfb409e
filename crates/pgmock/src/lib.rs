//! # pgmock
//!
//! A mock PostgreSQL driver for testing database code without a server.
//!
//! Application code is written against the [`Executor`], [`PgConnection`]
//! and [`PgTransaction`] traits. In production those are implemented by a
//! real driver; in tests a [`MockConn`] stands in. The test declares the
//! calls it expects, each with its arguments and its canned outcome, runs
//! the code under test, and finally asserts with
//! [`MockConn::expectations_were_met`] that nothing was left unused.
//!
//! ## Features
//!
//! - **Ordered matching**: Calls must arrive in declaration order by default
//! - **Regex or exact statement matching**: Pluggable via [`QueryMatcher`]
//! - **Argument matchers**: Exact values, wildcards, or custom predicates
//! - **Canned results**: Command tags, result sets, per-row and close errors
//! - **Delays and timeouts**: Simulated latency against a command timeout
//! - **Prepared statements**: Executed by name, tracked per connection
//! - **Tracing**: Every call runs in a `tracing` span
//!
//! ## Example
//!
//! ```rust
//! use pgmock::{CommandTag, Error, Executor, MockConn, PgConnection, PgTransaction};
//!
//! # tokio_test::block_on(async {
//! let mock = MockConn::new().unwrap();
//! mock.expect_begin();
//! mock.expect_exec("INSERT INTO product_viewers")
//!     .with_args(&[&2i64, &3i64])
//!     .will_return_result(CommandTag::new("INSERT", 1));
//! mock.expect_commit();
//!
//! let tx = mock.begin().await?;
//! tx.execute(
//!     "INSERT INTO product_viewers (user_id, product_id) VALUES ($1, $2)",
//!     &[&2i64, &3i64],
//! )
//! .await?;
//! tx.commit().await?;
//!
//! mock.expectations_were_met()?;
//! # Ok::<(), Error>(())
//! # }).unwrap();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod conn;
pub mod driver;
pub mod error;
pub mod expectation;
pub mod from_row;
pub mod instrumentation;
pub mod kind;
pub mod matcher;
pub mod result;
pub mod rows;
pub mod statement;
pub mod transaction;

// Re-export commonly used types
pub use config::{Config, TimeoutConfig};
pub use conn::MockConn;
pub use driver::{Executor, PgConnection, PgTransaction, in_transaction};
pub use error::{Error, Result};
pub use expectation::{
    Expected, ExpectedBegin, ExpectedClose, ExpectedCommit, ExpectedCopyFrom, ExpectedDeallocate,
    ExpectedDeallocateAll, ExpectedExec, ExpectedPing, ExpectedPrepare, ExpectedQuery,
    ExpectedRollback,
};
pub use from_row::{FromRow, MapRows, RowIteratorExt, aliased_column, columns_aliased};
pub use instrumentation::SanitizationConfig;
pub use kind::CallKind;
pub use matcher::{Arg, Argument, EqualMatcher, QueryMatcher, RegexMatcher, strip_query};
pub use pgmock_types::{FromSql, PgValue, ToSql, TypeError};
pub use result::CommandTag;
pub use rows::{ColMetaData, Column, MockRows, Row, Rows};
pub use statement::{StatementDescription, StatementRegistry};
pub use transaction::{AccessMode, IsolationLevel, MockTransaction, TxOptions};

#[cfg(feature = "derive")]
pub use pgmock_derive::FromRow;
