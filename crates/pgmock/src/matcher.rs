//! Statement and argument matching.
//!
//! A [`QueryMatcher`] decides whether the SQL text of a call satisfies the
//! pattern an expectation was declared with. Two matchers ship with the
//! crate:
//!
//! - [`RegexMatcher`] (default): the expected pattern is a regular
//!   expression searched for anywhere in the actual SQL.
//! - [`EqualMatcher`]: the expected and actual SQL must be identical.
//!
//! Both normalise whitespace first, so a test does not depend on how the
//! application formats its SQL.
//!
//! Bound arguments are compared through [`Arg`], which wraps literal values,
//! wildcards, and user-defined [`Argument`] implementations.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use pgmock_types::{PgValue, ToSql};
use regex::Regex;

#[allow(clippy::unwrap_used)]
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse runs of whitespace into a single space and trim both ends.
#[must_use]
pub fn strip_query(sql: &str) -> String {
    WHITESPACE.replace_all(sql, " ").trim().to_string()
}

/// Decides whether actual SQL satisfies an expected pattern.
///
/// Implementations return `Err` with a human readable reason when the SQL
/// does not match, or when the pattern itself is unusable.
pub trait QueryMatcher: Send + Sync + fmt::Debug {
    /// Compare `actual` SQL against the `expected` pattern.
    fn matches(&self, expected: &str, actual: &str) -> Result<(), String>;
}

/// Regular expression matcher (the default).
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexMatcher;

impl QueryMatcher for RegexMatcher {
    fn matches(&self, expected: &str, actual: &str) -> Result<(), String> {
        let expected = strip_query(expected);
        let actual = strip_query(actual);
        let re = Regex::new(&expected)
            .map_err(|e| format!("could not compile regexp '{expected}': {e}"))?;
        if re.is_match(&actual) {
            Ok(())
        } else {
            Err(format!(
                "could not match actual sql: \"{actual}\" with expected regexp \"{expected}\""
            ))
        }
    }
}

/// Exact string matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualMatcher;

impl QueryMatcher for EqualMatcher {
    fn matches(&self, expected: &str, actual: &str) -> Result<(), String> {
        let expected = strip_query(expected);
        let actual = strip_query(actual);
        if expected == actual {
            Ok(())
        } else {
            Err(format!(
                "actual sql: \"{actual}\" does not equal to expected \"{expected}\""
            ))
        }
    }
}

/// A user-defined argument matcher.
///
/// # Example
///
/// ```rust
/// use pgmock::{Arg, Argument, PgValue};
///
/// #[derive(Debug)]
/// struct Positive;
///
/// impl Argument for Positive {
///     fn matches(&self, value: &PgValue) -> bool {
///         value.as_i64().is_some_and(|v| v > 0)
///     }
/// }
///
/// let arg = Arg::custom(Positive);
/// assert!(arg.matches(&PgValue::Int4(3)));
/// ```
pub trait Argument: Send + Sync + fmt::Debug {
    /// Check whether a bound argument is acceptable.
    fn matches(&self, value: &PgValue) -> bool;
}

/// One expected argument of a call.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Matches a value equal to this one (integers and floats compare
    /// across widths).
    Value(PgValue),
    /// Matches any value, including NULL.
    Any,
    /// Matches according to a user-defined [`Argument`].
    Custom(Arc<dyn Argument>),
    /// A value that could not be converted when the expectation was
    /// declared. Never matches.
    Invalid(String),
}

impl Arg {
    /// Expect a specific value.
    pub fn value<T: ToSql + ?Sized>(value: &T) -> Self {
        match value.to_sql() {
            Ok(v) => Self::Value(v),
            Err(e) => Self::Invalid(e.to_string()),
        }
    }

    /// Accept any value.
    #[must_use]
    pub fn any() -> Self {
        Self::Any
    }

    /// Use a custom matcher.
    pub fn custom<A: Argument + 'static>(matcher: A) -> Self {
        Self::Custom(Arc::new(matcher))
    }

    /// Check whether `actual` satisfies this argument.
    #[must_use]
    pub fn matches(&self, actual: &PgValue) -> bool {
        match self {
            Self::Value(expected) => expected.loosely_eq(actual),
            Self::Any => true,
            Self::Custom(m) => m.matches(actual),
            Self::Invalid(_) => false,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Any => f.write_str("<any>"),
            Self::Custom(m) => write!(f, "{m:?}"),
            Self::Invalid(reason) => write!(f, "<invalid: {reason}>"),
        }
    }
}

impl From<PgValue> for Arg {
    fn from(value: PgValue) -> Self {
        Self::Value(value)
    }
}

/// Convert statement parameters into values, reporting the first failure.
pub(crate) fn bind_params(
    params: &[&(dyn ToSql + Sync)],
) -> Result<Vec<PgValue>, pgmock_types::TypeError> {
    params.iter().map(|p| p.to_sql()).collect()
}

/// Compare the actual arguments of a call with the expected ones.
pub(crate) fn args_match(expected: &[Arg], actual: &[PgValue]) -> Result<(), String> {
    if expected.len() != actual.len() {
        return Err(format!(
            "expected {} arguments, got {}",
            expected.len(),
            actual.len()
        ));
    }
    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
        if !e.matches(a) {
            return Err(format!(
                "argument {i} expected {e} ({}), got {a} ({})",
                arg_type(e),
                a.type_name()
            ));
        }
    }
    Ok(())
}

fn arg_type(arg: &Arg) -> &'static str {
    match arg {
        Arg::Value(v) => v.type_name(),
        _ => "matcher",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_query() {
        assert_eq!(
            strip_query("  SELECT *\n\tFROM  orders  "),
            "SELECT * FROM orders"
        );
    }

    #[test]
    fn test_regex_matcher_substring() {
        let m = RegexMatcher;
        assert!(m.matches("UPDATE products", "UPDATE products SET views = views + 1").is_ok());
        assert!(
            m.matches(
                "SELECT (.+) FROM orders AS o INNER JOIN users AS u (.+) FOR UPDATE",
                "SELECT o.id AS o_id FROM orders AS o\n  INNER JOIN users AS u ON o.buyer_id = u.id WHERE o.id = $1 FOR UPDATE"
            )
            .is_ok()
        );
        assert!(m.matches("INSERT INTO product_viewers", "UPDATE products").is_err());
    }

    #[test]
    fn test_regex_matcher_bad_pattern() {
        let err = RegexMatcher.matches("SELECT (", "SELECT 1").unwrap_err();
        assert!(err.contains("could not compile regexp"));
    }

    #[test]
    fn test_equal_matcher() {
        let m = EqualMatcher;
        assert!(m.matches("SELECT 1", "  SELECT\n1 ").is_ok());
        assert!(m.matches("SELECT 1", "SELECT 12").is_err());
    }

    #[test]
    fn test_args_match_widths() {
        let expected = vec![Arg::value(&29.0f64), Arg::value(&2i32)];
        let actual = vec![PgValue::Float8(25.75 + 3.25), PgValue::Int8(2)];
        assert!(args_match(&expected, &actual).is_ok());
    }

    #[test]
    fn test_args_match_reports_position() {
        let expected = vec![Arg::value(&1i64), Arg::value(&"a")];
        let actual = vec![PgValue::Int8(1), PgValue::from("b")];
        let reason = args_match(&expected, &actual).unwrap_err();
        assert!(reason.starts_with("argument 1 expected 'a'"), "{reason}");
    }

    #[test]
    fn test_args_match_length() {
        let reason = args_match(&[Arg::any()], &[]).unwrap_err();
        assert_eq!(reason, "expected 1 arguments, got 0");
    }

    #[test]
    fn test_invalid_arg_never_matches() {
        let arg = Arg::value(&u64::MAX);
        assert!(matches!(arg, Arg::Invalid(_)));
        assert!(!arg.matches(&PgValue::Int8(-1)));
    }
}
