//! The driver call surface.
//!
//! Application code is written against these traits instead of a concrete
//! connection type, so the same function runs on a live driver in
//! production and on a [`MockConn`](crate::MockConn) in tests.
//!
//! The traits use `#[async_trait]` so their futures are `Send` and the
//! traits stay object safe.

use futures_util::future::BoxFuture;
use pgmock_types::{PgValue, ToSql};

use crate::error::{Error, Result};
use crate::result::CommandTag;
use crate::rows::{Row, Rows};
use crate::statement::StatementDescription;
use crate::transaction::TxOptions;

/// Operations shared by connections and transactions.
#[async_trait::async_trait]
pub trait Executor: Send + Sync {
    /// Execute a statement, returning its command tag.
    ///
    /// `sql` is either statement text or the name of a prepared statement.
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<CommandTag>;

    /// Run a query, returning its rows.
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Rows>;

    /// Run a query that must produce at least one row, returning the first.
    ///
    /// Fails with [`Error::NoRows`] when the result set is empty.
    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Row> {
        let mut rows = self.query(sql, params).await?;
        let first = rows.next();
        let closed = rows.close();
        match first {
            Some(Ok(row)) => closed.map(|()| row),
            Some(Err(err)) => Err(err),
            None => closed.and(Err(Error::NoRows)),
        }
    }

    /// Prepare a named statement.
    async fn prepare(&self, name: &str, sql: &str) -> Result<StatementDescription>;

    /// Bulk load rows with COPY FROM, returning the number copied.
    async fn copy_from(&self, table: &str, columns: &[&str], rows: Vec<Vec<PgValue>>)
    -> Result<u64>;
}

/// A database connection.
#[async_trait::async_trait]
pub trait PgConnection: Executor {
    /// The transaction type this connection starts.
    type Transaction: PgTransaction;

    /// Start a transaction with server default options.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Start a transaction with explicit options.
    async fn begin_with(&self, options: TxOptions) -> Result<Self::Transaction>;

    /// Release a prepared statement.
    async fn deallocate(&self, name: &str) -> Result<()>;

    /// Release every prepared statement.
    async fn deallocate_all(&self) -> Result<()>;

    /// Check that the connection is alive.
    async fn ping(&self) -> Result<()>;

    /// Close the connection.
    async fn close(&self) -> Result<()>;
}

/// An open transaction.
///
/// `commit` and `rollback` consume the transaction, so each transaction is
/// finished at most once.
#[async_trait::async_trait]
pub trait PgTransaction: Executor + Sized {
    /// Commit the transaction.
    async fn commit(self) -> Result<()>;

    /// Roll the transaction back.
    async fn rollback(self) -> Result<()>;
}

/// Run `f` inside a transaction.
///
/// Commits when `f` returns `Ok` and returns the commit's result. Otherwise
/// rolls back and returns the error from `f`; a failing rollback is logged
/// and does not replace that error.
///
/// # Example
///
/// ```rust
/// use pgmock::{CommandTag, Executor, MockConn, in_transaction};
///
/// # tokio_test::block_on(async {
/// let mock = MockConn::new().unwrap();
/// mock.expect_begin();
/// mock.expect_exec("UPDATE products")
///     .will_return_result(CommandTag::new("UPDATE", 1));
/// mock.expect_commit();
///
/// let tag = in_transaction(&mock, |tx| {
///     Box::pin(async move { tx.execute("UPDATE products SET views = views + 1", &[]).await })
/// })
/// .await
/// .unwrap();
///
/// assert_eq!(tag.rows_affected(), 1);
/// mock.expectations_were_met().unwrap();
/// # });
/// ```
pub async fn in_transaction<C, T, F>(conn: &C, f: F) -> Result<T>
where
    C: PgConnection + ?Sized,
    T: Send,
    F: for<'t> FnOnce(&'t C::Transaction) -> BoxFuture<'t, Result<T>> + Send,
{
    let tx = conn.begin().await?;
    let outcome = f(&tx).await;
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(
                    error = %err,
                    rollback_error = %rollback_err,
                    "rollback after failed transaction block failed"
                );
            }
            Err(err)
        }
    }
}
