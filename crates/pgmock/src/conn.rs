//! The mock connection and its expectation engine.
//!
//! A [`MockConn`] owns an ordered list of expectations. Each driver call is
//! matched against that list under a mutex; a successful match consumes
//! one trigger of the expectation and yields its declared outcome. Declared
//! delays are awaited after the lock is released, so concurrent calls
//! against one connection never block each other on a sleeping call.
//!
//! ## Matching
//!
//! In ordered mode (the default) a call must be accepted by the first
//! expectation that is not yet exhausted. Optional expectations that do not
//! accept the call are skipped. A rejected call fails with a contract
//! violation and consumes nothing.
//!
//! In unordered mode a call is matched against the first non-exhausted
//! expectation that accepts it, in registration order.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pgmock_types::{PgValue, ToSql};
use tracing::Instrument;

use crate::config::Config;
use crate::driver::{Executor, PgConnection};
use crate::error::{Error, Result};
use crate::expectation::{
    Call, Expectation, Expected, ExpectedBegin, ExpectedClose, ExpectedCommit, ExpectedCopyFrom,
    ExpectedDeallocate, ExpectedDeallocateAll, ExpectedExec, ExpectedPing, ExpectedPrepare,
    ExpectedQuery, ExpectedRollback, Outcome,
};
use crate::instrumentation::call_span;
use crate::kind::CallKind;
use crate::matcher::bind_params;
use crate::result::CommandTag;
use crate::rows::{MockRows, Rows};
use crate::statement::{StatementDescription, StatementRegistry};
use crate::transaction::{MockTransaction, TxOptions};

/// State shared between a connection, its clones, its transactions and the
/// expectation handles.
pub(crate) struct Shared {
    pub(crate) config: Config,
    pub(crate) state: Mutex<MockState>,
}

impl Shared {
    /// Register an expectation, returning its index.
    pub(crate) fn push(&self, expectation: Expectation) -> usize {
        let mut state = self.state.lock();
        state.expectations.push(expectation);
        state.expectations.len() - 1
    }
}

pub(crate) struct MockState {
    pub(crate) expectations: Vec<Expectation>,
    statements: StatementRegistry,
    ordered: bool,
    closed: bool,
    next_tx_id: u64,
}

/// A mock PostgreSQL connection.
///
/// Cloning is cheap and every clone shares the same expectations, so a
/// test can hand one clone to the code under test and keep another for
/// verification.
///
/// # Example
///
/// ```rust
/// use pgmock::{CommandTag, Executor, MockConn, PgConnection, PgTransaction};
///
/// # tokio_test::block_on(async {
/// let mock = MockConn::new().unwrap();
/// mock.expect_begin();
/// mock.expect_exec("UPDATE products")
///     .will_return_result(CommandTag::new("UPDATE", 1));
/// mock.expect_commit();
///
/// let tx = mock.begin().await.unwrap();
/// tx.execute("UPDATE products SET views = views + 1", &[]).await.unwrap();
/// tx.commit().await.unwrap();
///
/// mock.expectations_were_met().unwrap();
/// # });
/// ```
#[derive(Clone)]
pub struct MockConn {
    shared: Arc<Shared>,
}

impl MockConn {
    /// Create a mock connection with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a mock connection with a custom configuration.
    ///
    /// Fails with [`Error::Config`] if the configuration is invalid.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let ordered = config.ordered;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(MockState {
                    expectations: Vec::new(),
                    statements: StatementRegistry::new(),
                    ordered,
                    closed: false,
                    next_tx_id: 1,
                }),
            }),
        })
    }

    /// The configuration this connection was created with.
    ///
    /// Later calls to [`match_expectations_in_order`](Self::match_expectations_in_order)
    /// are not reflected here; use [`is_ordered`](Self::is_ordered).
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Switch between ordered and unordered matching.
    pub fn match_expectations_in_order(&self, ordered: bool) {
        self.shared.state.lock().ordered = ordered;
    }

    /// Check if calls must currently arrive in registration order.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.shared.state.lock().ordered
    }

    /// Start building a canned result set.
    #[must_use]
    pub fn new_rows(&self, columns: &[&str]) -> MockRows {
        MockRows::new(columns)
    }

    /// Check if the connection was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Look up a prepared statement by name.
    #[must_use]
    pub fn statement(&self, name: &str) -> Option<StatementDescription> {
        self.shared.state.lock().statements.get(name).cloned()
    }

    // ========================================================================
    // Expectation Setup
    // ========================================================================

    fn expect<K: crate::kind::ExpectationKind>(&self, expectation: Expectation) -> Expected<K> {
        let index = self.shared.push(expectation);
        Expected::new(Arc::clone(&self.shared), index)
    }

    /// Expect a transaction to be started.
    pub fn expect_begin(&self) -> ExpectedBegin {
        self.expect(Expectation::new(CallKind::Begin))
    }

    /// Expect a transaction to be committed.
    pub fn expect_commit(&self) -> ExpectedCommit {
        self.expect(Expectation::new(CallKind::Commit))
    }

    /// Expect a transaction to be rolled back.
    pub fn expect_rollback(&self) -> ExpectedRollback {
        self.expect(Expectation::new(CallKind::Rollback))
    }

    /// Expect a statement execution whose SQL matches `sql`.
    pub fn expect_exec(&self, sql: &str) -> ExpectedExec {
        self.expect(Expectation::new(CallKind::Exec).with_sql(sql))
    }

    /// Expect a query whose SQL matches `sql`.
    pub fn expect_query(&self, sql: &str) -> ExpectedQuery {
        self.expect(Expectation::new(CallKind::Query).with_sql(sql))
    }

    /// Expect `prepare(name, ..)` with SQL matching `sql`.
    pub fn expect_prepare(&self, name: &str, sql: &str) -> ExpectedPrepare {
        self.expect(
            Expectation::new(CallKind::Prepare)
                .with_name(name)
                .with_sql(sql),
        )
    }

    /// Expect a prepared statement to be deallocated.
    pub fn expect_deallocate(&self, name: &str) -> ExpectedDeallocate {
        self.expect(Expectation::new(CallKind::Deallocate).with_name(name))
    }

    /// Expect every prepared statement to be deallocated.
    pub fn expect_deallocate_all(&self) -> ExpectedDeallocateAll {
        self.expect(Expectation::new(CallKind::DeallocateAll))
    }

    /// Expect a ping.
    pub fn expect_ping(&self) -> ExpectedPing {
        self.expect(Expectation::new(CallKind::Ping))
    }

    /// Expect the connection to be closed.
    pub fn expect_close(&self) -> ExpectedClose {
        self.expect(Expectation::new(CallKind::Close))
    }

    /// Expect a COPY FROM into `table` with exactly these columns.
    pub fn expect_copy_from(&self, table: &str, columns: &[&str]) -> ExpectedCopyFrom {
        let mut expectation = Expectation::new(CallKind::CopyFrom);
        expectation.table = Some(table.to_string());
        expectation.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self.expect(expectation)
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Check that every declared expectation was triggered.
    ///
    /// Fails with [`Error::UnfulfilledExpectations`] listing each
    /// expectation that was not triggered often enough, and each query
    /// expectation whose rows had to be closed but were not.
    pub fn expectations_were_met(&self) -> Result<()> {
        let state = self.shared.state.lock();
        let remaining: Vec<String> = state
            .expectations
            .iter()
            .filter_map(Expectation::unmet_reason)
            .collect();

        if remaining.is_empty() {
            Ok(())
        } else {
            tracing::warn!(count = remaining.len(), "unfulfilled expectations");
            Err(Error::UnfulfilledExpectations { remaining })
        }
    }

    // ========================================================================
    // Call Dispatch
    // ========================================================================

    /// Match a call against the expectations and consume the winner.
    fn consume(&self, call: &Call<'_>) -> Result<Outcome> {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;

        if state.closed {
            return Err(Error::ConnectionClosed);
        }

        let matcher = self.shared.config.query_matcher.as_ref();
        let mut rejection: Option<Error> = None;
        let mut first_pending: Option<String> = None;
        let mut chosen: Option<usize> = None;

        for (index, expectation) in state.expectations.iter().enumerate() {
            if expectation.exhausted() {
                continue;
            }
            if first_pending.is_none() {
                first_pending = Some(expectation.to_string());
            }
            match expectation.accepts(call, matcher, &state.statements) {
                Ok(()) => {
                    chosen = Some(index);
                    break;
                }
                Err(err) if state.ordered => {
                    if !(expectation.optional && expectation.triggered == 0) {
                        rejection = Some(err);
                        break;
                    }
                }
                // The first expectation of the same kind explains the miss best.
                Err(err) => {
                    if rejection.is_none() && expectation.kind == call.kind {
                        rejection = Some(err);
                    }
                }
            }
        }

        let Some(index) = chosen else {
            let err = rejection.unwrap_or_else(|| Error::UnexpectedCall {
                call: call.to_string(),
                next: first_pending,
            });
            tracing::warn!(call = %call, error = %err, "call rejected");
            return Err(err);
        };

        if state.ordered {
            for skipped in state.expectations.iter_mut().take(index) {
                skipped.pass_over();
            }
        }

        let outcome = match state.expectations.get_mut(index) {
            Some(expectation) => expectation.trigger(),
            None => {
                return Err(Error::UnexpectedCall {
                    call: call.to_string(),
                    next: None,
                });
            }
        };
        tracing::debug!(call = %call, expectation = index, "call matched");
        Ok(outcome)
    }

    /// Match a call, then wait out any declared delay.
    async fn dispatch(&self, call: Call<'_>) -> Result<Outcome> {
        let outcome = self.consume(&call)?;
        if let Some(delay) = outcome.delay {
            self.delay(delay).await?;
        }
        tracing::trace!(kind = %outcome.kind, expectation = %outcome.description, "outcome delivered");
        Ok(outcome)
    }

    async fn delay(&self, delay: Duration) -> Result<()> {
        match self.shared.config.timeouts.command_timeout {
            Some(limit) => tokio::time::timeout(limit, tokio::time::sleep(delay))
                .await
                .map_err(|_| {
                    tracing::debug!(?delay, ?limit, "declared delay exceeded command timeout");
                    Error::CommandTimeout
                }),
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    /// Run a call that carries no statement and returns nothing.
    pub(crate) async fn run_simple(&self, kind: CallKind) -> Result<()> {
        let span = call_span(kind, None, &self.shared.config.sanitization);
        async {
            let outcome = self.dispatch(Call::new(kind)).await?;
            outcome.check()
        }
        .instrument(span)
        .await
    }

    async fn start_transaction(&self, options: TxOptions) -> Result<MockTransaction> {
        let span = call_span(CallKind::Begin, None, &self.shared.config.sanitization);
        async {
            let mut call = Call::new(CallKind::Begin);
            call.tx_options = Some(options);
            self.dispatch(call).await?.check()?;
            let id = {
                let mut state = self.shared.state.lock();
                let id = state.next_tx_id;
                state.next_tx_id += 1;
                id
            };
            Ok::<_, Error>(MockTransaction::new(self.clone(), id, options))
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for MockConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("MockConn")
            .field("expectations", &state.expectations.len())
            .field("statements", &state.statements.len())
            .field("ordered", &state.ordered)
            .field("closed", &state.closed)
            .finish()
    }
}

#[async_trait]
impl Executor for MockConn {
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<CommandTag> {
        let span = call_span(CallKind::Exec, Some(sql), &self.shared.config.sanitization);
        async {
            let args = bind_params(params)?;
            let outcome = self
                .dispatch(Call::new(CallKind::Exec).sql(sql).args(&args))
                .await?;
            outcome.check()?;
            outcome.result.ok_or_else(|| {
                Error::Config(format!(
                    "exec must return a result or raise an error: {}",
                    outcome.description
                ))
            })
        }
        .instrument(span)
        .await
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Rows> {
        let span = call_span(CallKind::Query, Some(sql), &self.shared.config.sanitization);
        async {
            let args = bind_params(params)?;
            let outcome = self
                .dispatch(Call::new(CallKind::Query).sql(sql).args(&args))
                .await?;
            outcome.check()?;
            match outcome.rows {
                Some(rows) => rows.into_rows(Some(outcome.rows_closed)),
                None => Err(Error::Config(format!(
                    "query must return rows or raise an error: {}",
                    outcome.description
                ))),
            }
        }
        .instrument(span)
        .await
    }

    async fn prepare(&self, name: &str, sql: &str) -> Result<StatementDescription> {
        let span = call_span(CallKind::Prepare, Some(sql), &self.shared.config.sanitization);
        async {
            self.dispatch(Call::new(CallKind::Prepare).name(name).sql(sql))
                .await?
                .check()?;
            let description = StatementDescription::new(name, sql);
            self.shared
                .state
                .lock()
                .statements
                .insert(description.clone());
            Ok::<_, Error>(description)
        }
        .instrument(span)
        .await
    }

    async fn copy_from(
        &self,
        table: &str,
        columns: &[&str],
        rows: Vec<Vec<PgValue>>,
    ) -> Result<u64> {
        let span = call_span(CallKind::CopyFrom, None, &self.shared.config.sanitization);
        async {
            let mut call = Call::new(CallKind::CopyFrom).name(table);
            call.columns = columns;
            let outcome = self.dispatch(call).await?;
            outcome.check()?;
            Ok::<_, Error>(outcome.copied.unwrap_or(rows.len() as u64))
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl PgConnection for MockConn {
    type Transaction = MockTransaction;

    async fn begin(&self) -> Result<MockTransaction> {
        self.start_transaction(TxOptions::default()).await
    }

    async fn begin_with(&self, options: TxOptions) -> Result<MockTransaction> {
        self.start_transaction(options).await
    }

    async fn deallocate(&self, name: &str) -> Result<()> {
        let span = call_span(CallKind::Deallocate, None, &self.shared.config.sanitization);
        async {
            self.dispatch(Call::new(CallKind::Deallocate).name(name))
                .await?
                .check()?;
            self.shared.state.lock().statements.remove(name);
            Ok::<_, Error>(())
        }
        .instrument(span)
        .await
    }

    async fn deallocate_all(&self) -> Result<()> {
        self.run_simple(CallKind::DeallocateAll).await?;
        self.shared.state.lock().statements.clear().for_each(drop);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.run_simple(CallKind::Ping).await
    }

    async fn close(&self) -> Result<()> {
        self.run_simple(CallKind::Close).await?;
        let mut state = self.shared.state.lock();
        state.closed = true;
        state.statements.clear().for_each(drop);
        tracing::debug!("mock connection closed");
        Ok(())
    }
}
