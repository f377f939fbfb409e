//! Mock driver error types.

use std::sync::Arc;

use thiserror::Error;

/// Errors returned by the mock driver.
///
/// The type is `Clone` so a test can declare an error outcome once and have
/// the mock hand out a copy every time the expectation is triggered.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum Error {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The connection was closed and can no longer be used.
    #[error("connection closed")]
    ConnectionClosed,

    /// Type conversion error.
    #[error("type error: {0}")]
    Type(#[from] pgmock_types::TypeError),

    /// Query execution error.
    #[error("query error: {0}")]
    Query(String),

    /// Server returned an error.
    #[error("server error {code}: {message}")]
    Server {
        /// SQLSTATE code (for example `23505` for a unique violation).
        code: String,
        /// Primary error message.
        message: String,
        /// Optional secondary message.
        detail: Option<String>,
        /// Table the error relates to, if any.
        table: Option<String>,
        /// Constraint the error relates to, if any.
        constraint: Option<String>,
    },

    /// An arbitrary error declared by a test.
    #[error("{0}")]
    Custom(Arc<dyn std::error::Error + Send + Sync>),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Configuration or setup error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Command execution timeout occurred.
    #[error("command timed out")]
    CommandTimeout,

    /// A single-row query produced no rows.
    #[error("no rows in result set")]
    NoRows,

    /// A call arrived that no remaining expectation accepts.
    #[error("call to {call} was not expected{}", next_hint(.next))]
    UnexpectedCall {
        /// Description of the call that was made.
        call: String,
        /// The next expectation in line, if there is one.
        next: Option<String>,
    },

    /// The statement text did not match the expectation's pattern.
    #[error("{call}: statement does not match {expected}: {reason}")]
    StatementMismatch {
        /// Description of the call that was made.
        call: String,
        /// The expectation the call was compared with.
        expected: String,
        /// Matcher diagnostic.
        reason: String,
    },

    /// The bound arguments did not match the expectation.
    #[error("{call}: arguments do not match: {reason}")]
    ArgumentMismatch {
        /// Description of the call that was made.
        call: String,
        /// What differed.
        reason: String,
    },

    /// Verification found expectations that were never triggered.
    #[error("there are {} unfulfilled expectations:\n{}", .remaining.len(), .remaining.join("\n"))]
    UnfulfilledExpectations {
        /// One line per unmet expectation.
        remaining: Vec<String>,
    },
}

fn next_hint(next: &Option<String>) -> String {
    match next {
        Some(next) => format!(", next expectation is: {next}"),
        None => ", all expectations were already fulfilled".to_string(),
    }
}

impl Error {
    /// Wrap any error type as a declared test outcome.
    pub fn custom<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(err))
    }

    /// Build a server error with a SQLSTATE code and message.
    pub fn server(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Server {
            code: code.into(),
            message: message.into(),
            detail: None,
            table: None,
            constraint: None,
        }
    }

    /// Check if this error was raised by the mock itself because a call
    /// broke the declared expectations.
    ///
    /// Declared error outcomes are never contract violations, even when
    /// they carry the same message.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedCall { .. }
                | Self::StatementMismatch { .. }
                | Self::ArgumentMismatch { .. }
                | Self::UnfulfilledExpectations { .. }
        )
    }

    /// Check if this error is transient and may succeed on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::CommandTimeout | Self::ConnectionClosed)
            || matches!(self.sqlstate(), Some(code) if code.starts_with("40"))
    }

    /// Get the SQLSTATE if this is a server error.
    #[must_use]
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Server { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Result type for mock driver operations.
pub type Result<T> = std::result::Result<T, Error>;
