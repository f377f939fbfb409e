//! Tracing instrumentation for mock driver calls.
//!
//! Every call made against a [`MockConn`](crate::MockConn) runs inside a
//! `tracing` span, so a test that installs a subscriber sees the same call
//! structure a production trace would show.
//!
//! ## Semantic Conventions
//!
//! Span fields follow the OpenTelemetry database conventions:
//! - `db.system`: "postgresql"
//! - `db.operation`: Query operation type (SELECT, INSERT, etc.)
//! - `db.statement`: SQL statement (sanitized if configured)

use tracing::Span;

use crate::kind::CallKind;

/// Database system identifier for PostgreSQL.
pub const DB_SYSTEM: &str = "postgresql";

/// Span names for driver calls.
pub mod span_names {
    /// Span name for beginning a transaction.
    pub const BEGIN: &str = "pgmock.begin";
    /// Span name for committing a transaction.
    pub const COMMIT: &str = "pgmock.commit";
    /// Span name for rolling back a transaction.
    pub const ROLLBACK: &str = "pgmock.rollback";
    /// Span name for command execution.
    pub const EXECUTE: &str = "pgmock.execute";
    /// Span name for query execution.
    pub const QUERY: &str = "pgmock.query";
    /// Span name for preparing a statement.
    pub const PREPARE: &str = "pgmock.prepare";
    /// Span name for deallocating statements.
    pub const DEALLOCATE: &str = "pgmock.deallocate";
    /// Span name for pings.
    pub const PING: &str = "pgmock.ping";
    /// Span name for closing the connection.
    pub const CLOSE: &str = "pgmock.close";
    /// Span name for COPY FROM.
    pub const COPY_FROM: &str = "pgmock.copy_from";
}

/// Attribute keys following OpenTelemetry semantic conventions.
pub mod attributes {
    /// Database system type.
    pub const DB_SYSTEM: &str = "db.system";
    /// SQL statement (may be sanitized).
    pub const DB_STATEMENT: &str = "db.statement";
    /// Database operation type.
    pub const DB_OPERATION: &str = "db.operation";
}

/// Configuration for SQL statement sanitization.
#[derive(Debug, Clone)]
pub struct SanitizationConfig {
    /// Whether to sanitize SQL statements.
    pub enabled: bool,
    /// Maximum length of statement to record.
    pub max_length: usize,
    /// Placeholder to use for sanitized values.
    pub placeholder: String,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_length: 2048,
            placeholder: "?".to_string(),
        }
    }
}

impl SanitizationConfig {
    /// Create a configuration that doesn't sanitize statements.
    #[must_use]
    pub fn no_sanitization() -> Self {
        Self {
            enabled: false,
            max_length: usize::MAX,
            placeholder: String::new(),
        }
    }

    /// Sanitize a SQL statement according to the configuration.
    #[must_use]
    pub fn sanitize(&self, sql: &str) -> String {
        if !self.enabled {
            return truncate_string(sql, self.max_length);
        }
        let sanitized = sanitize_sql(sql, &self.placeholder);
        truncate_string(&sanitized, self.max_length)
    }
}

/// Replace string and numeric literals with a placeholder.
///
/// Positional parameters such as `$1` are kept.
fn sanitize_sql(sql: &str, placeholder: &str) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    continue;
                }
                in_string = false;
                result.push_str(placeholder);
            }
            continue;
        }

        if c == '\'' {
            in_string = true;
            continue;
        }

        if c.is_ascii_digit()
            && !result.ends_with(|ch: char| ch.is_alphanumeric() || ch == '_' || ch == '$')
        {
            while chars
                .peek()
                .is_some_and(|ch| ch.is_ascii_digit() || *ch == '.')
            {
                chars.next();
            }
            result.push_str(placeholder);
            continue;
        }

        result.push(c);
    }

    if in_string {
        result.push_str(placeholder);
    }

    result
}

/// Truncate a string to at most `max_len` bytes, on a character boundary.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Extract the operation type from a SQL statement.
#[must_use]
pub fn extract_operation(sql: &str) -> &'static str {
    let sql_upper = sql.trim_start().to_uppercase();

    if sql_upper.starts_with("SELECT") || sql_upper.starts_with("WITH") {
        "SELECT"
    } else if sql_upper.starts_with("INSERT") {
        "INSERT"
    } else if sql_upper.starts_with("UPDATE") {
        "UPDATE"
    } else if sql_upper.starts_with("DELETE") {
        "DELETE"
    } else if sql_upper.starts_with("BEGIN") || sql_upper.starts_with("START TRANSACTION") {
        "BEGIN"
    } else if sql_upper.starts_with("COMMIT") {
        "COMMIT"
    } else if sql_upper.starts_with("ROLLBACK") {
        "ROLLBACK"
    } else if sql_upper.starts_with("COPY") {
        "COPY"
    } else if sql_upper.starts_with("CREATE") {
        "CREATE"
    } else if sql_upper.starts_with("ALTER") {
        "ALTER"
    } else if sql_upper.starts_with("DROP") {
        "DROP"
    } else {
        "OTHER"
    }
}

macro_rules! call_span {
    ($name:expr, $operation:expr, $statement:expr) => {
        tracing::debug_span!(
            $name,
            db.system = DB_SYSTEM,
            db.operation = $operation,
            db.statement = %$statement,
        )
    };
}

/// Create the span a call of `kind` runs in.
pub(crate) fn call_span(kind: CallKind, sql: Option<&str>, config: &SanitizationConfig) -> Span {
    let statement = sql.map(|s| config.sanitize(s)).unwrap_or_default();
    let operation = match kind {
        CallKind::Exec | CallKind::Query | CallKind::Prepare => {
            sql.map_or("OTHER", extract_operation)
        }
        CallKind::Begin => "BEGIN",
        CallKind::Commit => "COMMIT",
        CallKind::Rollback => "ROLLBACK",
        CallKind::Deallocate | CallKind::DeallocateAll => "DEALLOCATE",
        CallKind::CopyFrom => "COPY",
        CallKind::Ping | CallKind::Close => "OTHER",
    };

    match kind {
        CallKind::Begin => call_span!(span_names::BEGIN, operation, statement),
        CallKind::Commit => call_span!(span_names::COMMIT, operation, statement),
        CallKind::Rollback => call_span!(span_names::ROLLBACK, operation, statement),
        CallKind::Exec => call_span!(span_names::EXECUTE, operation, statement),
        CallKind::Query => call_span!(span_names::QUERY, operation, statement),
        CallKind::Prepare => call_span!(span_names::PREPARE, operation, statement),
        CallKind::Deallocate | CallKind::DeallocateAll => {
            call_span!(span_names::DEALLOCATE, operation, statement)
        }
        CallKind::Ping => call_span!(span_names::PING, operation, statement),
        CallKind::Close => call_span!(span_names::CLOSE, operation, statement),
        CallKind::CopyFrom => call_span!(span_names::COPY_FROM, operation, statement),
    }
}
