//! Declared expectations and their builder handles.
//!
//! An [`Expectation`] records one predicted driver call: its kind, the
//! statement pattern and arguments it must match, and the outcome it hands
//! back. Tests never see the record directly; they configure it through the
//! [`Expected<K>`] handle returned by the `expect_*` methods of
//! [`MockConn`](crate::MockConn).

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pgmock_types::{PgValue, ToSql};

use crate::conn::Shared;
use crate::error::{Error, Result};
use crate::kind::{self, CallKind, ExpectationKind, Parameterized};
use crate::matcher::{Arg, QueryMatcher, args_match};
use crate::result::CommandTag;
use crate::rows::MockRows;
use crate::statement::StatementRegistry;
use crate::transaction::TxOptions;

/// Handle for a begin expectation.
pub type ExpectedBegin = Expected<kind::Begin>;
/// Handle for a commit expectation.
pub type ExpectedCommit = Expected<kind::Commit>;
/// Handle for a rollback expectation.
pub type ExpectedRollback = Expected<kind::Rollback>;
/// Handle for an exec expectation.
pub type ExpectedExec = Expected<kind::Exec>;
/// Handle for a query expectation.
pub type ExpectedQuery = Expected<kind::Query>;
/// Handle for a prepare expectation.
pub type ExpectedPrepare = Expected<kind::Prepare>;
/// Handle for a deallocate expectation.
pub type ExpectedDeallocate = Expected<kind::Deallocate>;
/// Handle for a deallocate-all expectation.
pub type ExpectedDeallocateAll = Expected<kind::DeallocateAll>;
/// Handle for a ping expectation.
pub type ExpectedPing = Expected<kind::Ping>;
/// Handle for a close expectation.
pub type ExpectedClose = Expected<kind::Close>;
/// Handle for a copy-from expectation.
pub type ExpectedCopyFrom = Expected<kind::CopyFrom>;

/// A recorded expectation.
#[derive(Debug)]
pub(crate) struct Expectation {
    pub(crate) kind: CallKind,
    /// Statement pattern for exec, query and prepare.
    pub(crate) sql: Option<String>,
    /// Statement name for prepare and deallocate, or the prepared statement
    /// an exec/query expectation targets.
    pub(crate) name: Option<String>,
    pub(crate) args: Option<Vec<Arg>>,
    pub(crate) tx_options: Option<TxOptions>,
    pub(crate) table: Option<String>,
    pub(crate) columns: Vec<String>,
    pub(crate) error: Option<Error>,
    pub(crate) result: Option<CommandTag>,
    pub(crate) rows: Option<MockRows>,
    pub(crate) copied: Option<u64>,
    pub(crate) delay: Option<Duration>,
    pub(crate) times: u32,
    pub(crate) triggered: u32,
    pub(crate) optional: bool,
    /// An optional expectation ordered matching moved past untriggered.
    pub(crate) passed_over: bool,
    pub(crate) rows_must_close: bool,
    /// One closed flag per result set handed out.
    pub(crate) rows_closed: Vec<Arc<AtomicBool>>,
}

impl Expectation {
    pub(crate) fn new(kind: CallKind) -> Self {
        Self {
            kind,
            sql: None,
            name: None,
            args: None,
            tx_options: None,
            table: None,
            columns: Vec::new(),
            error: None,
            result: None,
            rows: None,
            copied: None,
            delay: None,
            times: 1,
            triggered: 0,
            optional: false,
            passed_over: false,
            rows_must_close: false,
            rows_closed: Vec::new(),
        }
    }

    pub(crate) fn with_sql(mut self, sql: &str) -> Self {
        self.sql = Some(sql.to_string());
        self
    }

    pub(crate) fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.passed_over || self.triggered >= self.times
    }

    /// Retire an untriggered optional expectation that a later one matched
    /// ahead of.
    pub(crate) fn pass_over(&mut self) {
        if self.optional && self.triggered == 0 {
            self.passed_over = true;
        }
    }

    /// Check whether `call` satisfies this expectation.
    ///
    /// The returned error is the contract violation the call fails with.
    pub(crate) fn accepts(
        &self,
        call: &Call<'_>,
        matcher: &dyn QueryMatcher,
        statements: &StatementRegistry,
    ) -> Result<()> {
        if self.kind != call.kind {
            return Err(Error::UnexpectedCall {
                call: call.to_string(),
                next: Some(self.to_string()),
            });
        }

        match self.kind {
            CallKind::Begin => self.check_options(call),
            CallKind::Exec | CallKind::Query => {
                self.check_statement(call, matcher, statements)?;
                self.check_args(call)
            }
            CallKind::Prepare => {
                self.check_name(call)?;
                self.check_pattern(call, matcher)
            }
            CallKind::Deallocate => self.check_name(call),
            CallKind::CopyFrom => self.check_copy(call),
            CallKind::Commit
            | CallKind::Rollback
            | CallKind::DeallocateAll
            | CallKind::Ping
            | CallKind::Close => Ok(()),
        }
    }

    /// Record one trigger and copy out the declared outcome.
    pub(crate) fn trigger(&mut self) -> Outcome {
        self.triggered += 1;
        let rows_closed = Arc::new(AtomicBool::new(false));
        if self.rows.is_some() && self.error.is_none() {
            self.rows_closed.push(Arc::clone(&rows_closed));
        }
        Outcome {
            kind: self.kind,
            error: self.error.clone(),
            result: self.result.clone(),
            rows: self.rows.clone(),
            copied: self.copied,
            delay: self.delay,
            rows_closed,
            description: self.to_string(),
        }
    }

    /// Why verification would report this expectation, if it would.
    pub(crate) fn unmet_reason(&self) -> Option<String> {
        if self.optional && self.triggered == 0 {
            return None;
        }
        if self.triggered < self.times {
            return Some(self.to_string());
        }
        if !self.rows_must_close {
            return None;
        }
        let open = self
            .rows_closed
            .iter()
            .filter(|closed| !closed.load(Ordering::SeqCst))
            .count();
        if open > 0 {
            return Some(format!(
                "{self}\n    - {open} of {} returned row sets were not closed",
                self.rows_closed.len()
            ));
        }
        None
    }

    fn check_options(&self, call: &Call<'_>) -> Result<()> {
        match &self.tx_options {
            Some(expected) if Some(expected) != call.tx_options.as_ref() => {
                Err(Error::ArgumentMismatch {
                    call: call.to_string(),
                    reason: format!(
                        "expected transaction options \"{expected}\", got \"{}\"",
                        call.tx_options.unwrap_or_default()
                    ),
                })
            }
            _ => Ok(()),
        }
    }

    fn check_statement(
        &self,
        call: &Call<'_>,
        matcher: &dyn QueryMatcher,
        statements: &StatementRegistry,
    ) -> Result<()> {
        let actual = call.sql.unwrap_or_default();

        if let Some(name) = &self.name {
            if actual.trim() == name {
                return Ok(());
            }
            return Err(Error::StatementMismatch {
                call: call.to_string(),
                expected: self.to_string(),
                reason: format!("expected prepared statement '{name}', got \"{actual}\""),
            });
        }

        let Some(pattern) = &self.sql else {
            return Ok(());
        };
        let Err(reason) = matcher.matches(pattern, actual) else {
            return Ok(());
        };

        // The text may name a prepared statement whose SQL matches.
        if let Some(stmt) = statements.get(actual.trim()) {
            if matcher.matches(pattern, stmt.sql()).is_ok() {
                return Ok(());
            }
        }

        Err(Error::StatementMismatch {
            call: call.to_string(),
            expected: self.to_string(),
            reason,
        })
    }

    fn check_pattern(&self, call: &Call<'_>, matcher: &dyn QueryMatcher) -> Result<()> {
        let Some(pattern) = &self.sql else {
            return Ok(());
        };
        matcher
            .matches(pattern, call.sql.unwrap_or_default())
            .map_err(|reason| Error::StatementMismatch {
                call: call.to_string(),
                expected: self.to_string(),
                reason,
            })
    }

    fn check_name(&self, call: &Call<'_>) -> Result<()> {
        match (&self.name, call.name) {
            (Some(expected), Some(actual)) if expected != actual => Err(Error::StatementMismatch {
                call: call.to_string(),
                expected: self.to_string(),
                reason: format!("expected statement name '{expected}', got '{actual}'"),
            }),
            _ => Ok(()),
        }
    }

    fn check_args(&self, call: &Call<'_>) -> Result<()> {
        let Some(expected) = &self.args else {
            return Ok(());
        };
        args_match(expected, call.args).map_err(|reason| Error::ArgumentMismatch {
            call: call.to_string(),
            reason,
        })
    }

    fn check_copy(&self, call: &Call<'_>) -> Result<()> {
        let actual_table = call.name.unwrap_or_default();
        if let Some(table) = &self.table {
            if table != actual_table {
                return Err(Error::StatementMismatch {
                    call: call.to_string(),
                    expected: self.to_string(),
                    reason: format!("expected table '{table}', got '{actual_table}'"),
                });
            }
        }
        if self.columns.iter().map(String::as_str).ne(call.columns.iter().copied()) {
            return Err(Error::ArgumentMismatch {
                call: call.to_string(),
                reason: format!(
                    "expected columns [{}], got [{}]",
                    self.columns.join(", "),
                    call.columns.join(", ")
                ),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expected{} => expecting call to {}()", self.kind, self.kind)?;
        if let Some(name) = &self.name {
            write!(f, "\n    - statement name: '{name}'")?;
        }
        if let Some(sql) = &self.sql {
            write!(f, "\n    - matches sql: '{sql}'")?;
        }
        if let Some(table) = &self.table {
            write!(f, "\n    - table: '{table}', columns: [{}]", self.columns.join(", "))?;
        }
        if let Some(opts) = &self.tx_options {
            write!(f, "\n    - with options: {opts}")?;
        }
        match &self.args {
            Some(args) if !args.is_empty() => {
                f.write_str("\n    - is with arguments:")?;
                for (i, arg) in args.iter().enumerate() {
                    write!(f, "\n        {i} - {arg}")?;
                }
            }
            Some(_) => f.write_str("\n    - is without arguments")?,
            None => {}
        }
        if let Some(result) = &self.result {
            write!(f, "\n    - should return Result: {result}")?;
        }
        if let Some(rows) = &self.rows {
            write!(f, "\n    - should return {} rows", rows.len())?;
        }
        if let Some(err) = &self.error {
            write!(f, "\n    - should return error: {err}")?;
        }
        if self.times > 1 {
            write!(f, "\n    - triggered {} of {} times", self.triggered, self.times)?;
        }
        Ok(())
    }
}

/// A driver call as seen by the matcher.
#[derive(Debug)]
pub(crate) struct Call<'a> {
    pub(crate) kind: CallKind,
    pub(crate) sql: Option<&'a str>,
    /// Statement name for prepare/deallocate, table name for copy-from.
    pub(crate) name: Option<&'a str>,
    pub(crate) args: &'a [PgValue],
    pub(crate) tx_options: Option<TxOptions>,
    pub(crate) columns: &'a [&'a str],
}

impl<'a> Call<'a> {
    pub(crate) fn new(kind: CallKind) -> Self {
        Self {
            kind,
            sql: None,
            name: None,
            args: &[],
            tx_options: None,
            columns: &[],
        }
    }

    pub(crate) fn sql(mut self, sql: &'a str) -> Self {
        self.sql = Some(sql);
        self
    }

    pub(crate) fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    pub(crate) fn args(mut self, args: &'a [PgValue]) -> Self {
        self.args = args;
        self
    }
}

impl fmt::Display for Call<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        let mut sep = "";
        if let Some(name) = self.name {
            write!(f, "'{name}'")?;
            sep = ", ";
        }
        if let Some(sql) = self.sql {
            write!(f, "{sep}'{sql}'")?;
            sep = ", ";
        }
        if !self.columns.is_empty() {
            write!(f, "{sep}[{}]", self.columns.join(", "))?;
            sep = ", ";
        }
        if let Some(opts) = &self.tx_options {
            write!(f, "{sep}{opts}")?;
            sep = ", ";
        }
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
            write!(f, "{sep}args [{}]", args.join(", "))?;
        }
        f.write_str(")")
    }
}

/// What a triggered expectation hands back to the call.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) kind: CallKind,
    pub(crate) error: Option<Error>,
    pub(crate) result: Option<CommandTag>,
    pub(crate) rows: Option<MockRows>,
    pub(crate) copied: Option<u64>,
    pub(crate) delay: Option<Duration>,
    pub(crate) rows_closed: Arc<AtomicBool>,
    pub(crate) description: String,
}

impl Outcome {
    /// Return the declared error, if any.
    pub(crate) fn check(&self) -> Result<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Builder handle for a registered expectation.
///
/// The marker `K` restricts the builder methods to those that make sense
/// for the predicted call. Every method updates the expectation in place
/// and returns the handle for chaining.
pub struct Expected<K: ExpectationKind> {
    shared: Arc<Shared>,
    index: usize,
    _kind: PhantomData<K>,
}

impl<K: ExpectationKind> Expected<K> {
    pub(crate) fn new(shared: Arc<Shared>, index: usize) -> Self {
        Self {
            shared,
            index,
            _kind: PhantomData,
        }
    }

    fn update(&self, f: impl FnOnce(&mut Expectation)) {
        let mut state = self.shared.state.lock();
        if let Some(exp) = state.expectations.get_mut(self.index) {
            f(exp);
        }
    }

    /// Return `err` when the expectation is triggered.
    pub fn will_return_error(self, err: Error) -> Self {
        self.update(|e| e.error = Some(err));
        self
    }

    /// Sleep for `delay` before returning the outcome.
    ///
    /// A delay longer than the configured command timeout makes the call
    /// fail with [`Error::CommandTimeout`].
    pub fn will_delay_for(self, delay: Duration) -> Self {
        self.update(|e| e.delay = Some(delay));
        self
    }

    /// Require the expectation to be triggered `n` times.
    ///
    /// `times(0)` is treated as `times(1)`.
    pub fn times(self, n: u32) -> Self {
        self.update(|e| e.times = n.max(1));
        self
    }

    /// Mark the expectation optional.
    ///
    /// Verification ignores it if it was never triggered, and in ordered
    /// mode a call it does not accept moves on to the next expectation.
    pub fn maybe(self) -> Self {
        self.update(|e| e.optional = true);
        self
    }

    /// Position of this expectation in registration order.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<K: Parameterized> Expected<K> {
    /// Expect these literal argument values.
    ///
    /// Integers compare equal across widths, as do floats.
    pub fn with_args(self, args: &[&(dyn ToSql + Sync)]) -> Self {
        let args: Vec<Arg> = args.iter().map(|a| Arg::value(*a)).collect();
        self.update(|e| e.args = Some(args));
        self
    }

    /// Expect arguments using matchers such as [`Arg::any`].
    pub fn with_arg_matchers(self, args: impl IntoIterator<Item = Arg>) -> Self {
        let args: Vec<Arg> = args.into_iter().collect();
        self.update(|e| e.args = Some(args));
        self
    }

    /// Expect a call without arguments.
    pub fn without_args(self) -> Self {
        self.update(|e| e.args = Some(Vec::new()));
        self
    }
}

impl Expected<kind::Exec> {
    /// Return this command tag when the expectation is triggered.
    pub fn will_return_result(self, result: CommandTag) -> Self {
        self.update(|e| e.result = Some(result));
        self
    }
}

impl Expected<kind::Query> {
    /// Return these rows when the expectation is triggered.
    pub fn will_return_rows(self, rows: MockRows) -> Self {
        self.update(|e| e.rows = Some(rows));
        self
    }

    /// Also require at verification that the returned rows were closed.
    pub fn rows_will_be_closed(self) -> Self {
        self.update(|e| e.rows_must_close = true);
        self
    }
}

impl Expected<kind::Begin> {
    /// Expect the transaction to be started with exactly these options.
    ///
    /// Without this, any options are accepted.
    pub fn with_options(self, options: TxOptions) -> Self {
        self.update(|e| e.tx_options = Some(options));
        self
    }
}

impl Expected<kind::CopyFrom> {
    /// Report this many copied rows.
    ///
    /// Without it the call reports the number of rows it was given.
    pub fn will_return_copied(self, rows: u64) -> Self {
        self.update(|e| e.copied = Some(rows));
        self
    }
}

impl Expected<kind::Prepare> {
    fn statement_name(&self) -> String {
        let state = self.shared.state.lock();
        state
            .expectations
            .get(self.index)
            .and_then(|e| e.name.clone())
            .unwrap_or_default()
    }

    /// Expect an exec of this prepared statement, addressed by name.
    pub fn expect_exec(&self) -> ExpectedExec {
        let name = self.statement_name();
        let index = self
            .shared
            .push(Expectation::new(CallKind::Exec).with_name(&name));
        Expected::new(Arc::clone(&self.shared), index)
    }

    /// Expect a query of this prepared statement, addressed by name.
    pub fn expect_query(&self) -> ExpectedQuery {
        let name = self.statement_name();
        let index = self
            .shared
            .push(Expectation::new(CallKind::Query).with_name(&name));
        Expected::new(Arc::clone(&self.shared), index)
    }
}

impl<K: ExpectationKind> fmt::Debug for Expected<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expected")
            .field("kind", &K::CALL)
            .field("index", &self.index)
            .finish()
    }
}
