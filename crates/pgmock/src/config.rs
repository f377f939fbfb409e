//! Mock connection configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::instrumentation::SanitizationConfig;
use crate::matcher::{EqualMatcher, QueryMatcher, RegexMatcher};

/// Timeout configuration for mock calls.
#[derive(Debug, Clone, Default)]
pub struct TimeoutConfig {
    /// Upper bound for a declared call delay (default: none).
    ///
    /// A call whose expectation delays longer than this fails with
    /// [`Error::CommandTimeout`] once the timeout has elapsed.
    pub command_timeout: Option<Duration>,
}

impl TimeoutConfig {
    /// Create a new timeout configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the command timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }
}

/// Configuration for a [`MockConn`](crate::MockConn).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use pgmock::{Config, MockConn};
///
/// let config = Config::new()
///     .exact_match()
///     .match_in_order(false)
///     .command_timeout(Duration::from_secs(1));
/// let conn = MockConn::with_config(config).unwrap();
/// assert!(!conn.is_closed());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Statement matcher (default: [`RegexMatcher`]).
    pub query_matcher: Arc<dyn QueryMatcher>,

    /// Whether calls must arrive in registration order (default: true).
    pub ordered: bool,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// How statements are recorded in tracing spans.
    pub sanitization: SanitizationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query_matcher: Arc::new(RegexMatcher),
            ordered: true,
            timeouts: TimeoutConfig::default(),
            sanitization: SanitizationConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom statement matcher.
    #[must_use]
    pub fn query_matcher(mut self, matcher: impl QueryMatcher + 'static) -> Self {
        self.query_matcher = Arc::new(matcher);
        self
    }

    /// Compare statements for exact (whitespace-normalised) equality.
    #[must_use]
    pub fn exact_match(self) -> Self {
        self.query_matcher(EqualMatcher)
    }

    /// Set whether calls must arrive in registration order.
    #[must_use]
    pub fn match_in_order(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// Set the command timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.command_timeout = Some(timeout);
        self
    }

    /// Set the timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the statement sanitization used in spans.
    #[must_use]
    pub fn sanitization(mut self, sanitization: SanitizationConfig) -> Self {
        self.sanitization = sanitization;
        self
    }

    /// Check the configuration for values a connection cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.timeouts.command_timeout == Some(Duration::ZERO) {
            return Err(Error::Config(
                "command timeout must be greater than zero".into(),
            ));
        }
        if self.sanitization.enabled && self.sanitization.max_length < 4 {
            return Err(Error::Config(format!(
                "sanitization max_length {} is too small to hold a truncated statement",
                self.sanitization.max_length
            )));
        }
        Ok(())
    }
}
