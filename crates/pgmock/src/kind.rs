//! Expectation kinds for the typed expectation handles.
//!
//! Every `expect_*` method on [`MockConn`](crate::MockConn) returns an
//! [`Expected<K>`](crate::Expected) whose marker type `K` decides which
//! builder methods are available:
//!
//! ```text
//! expect_begin()       -> Expected<Begin>     with_options
//! expect_exec(sql)     -> Expected<Exec>      with_args, will_return_result
//! expect_query(sql)    -> Expected<Query>     with_args, will_return_rows, rows_will_be_closed
//! expect_prepare(..)   -> Expected<Prepare>   expect_exec, expect_query
//! expect_copy_from(..) -> Expected<CopyFrom>  will_return_copied
//! ```
//!
//! Declaring rows on an exec expectation is therefore a compile error
//! rather than a test that silently never matches.

use std::fmt;

/// The kind of driver call an expectation predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CallKind {
    /// `begin` / `begin_with`.
    Begin,
    /// `commit`.
    Commit,
    /// `rollback`.
    Rollback,
    /// `execute`.
    Exec,
    /// `query` / `query_one`.
    Query,
    /// `prepare`.
    Prepare,
    /// `deallocate`.
    Deallocate,
    /// `deallocate_all`.
    DeallocateAll,
    /// `ping`.
    Ping,
    /// `close`.
    Close,
    /// `copy_from`.
    CopyFrom,
}

impl CallKind {
    /// Get the call name as shown in diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Begin => "Begin",
            Self::Commit => "Commit",
            Self::Rollback => "Rollback",
            Self::Exec => "Exec",
            Self::Query => "Query",
            Self::Prepare => "Prepare",
            Self::Deallocate => "Deallocate",
            Self::DeallocateAll => "DeallocateAll",
            Self::Ping => "Ping",
            Self::Close => "Close",
            Self::CopyFrom => "CopyFrom",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Marker trait for expectation kinds.
///
/// This trait is sealed to prevent external implementations,
/// ensuring that only the kinds defined in this crate are valid.
pub trait ExpectationKind: private::Sealed {
    /// The call this kind of expectation predicts.
    const CALL: CallKind;
}

/// Marker for kinds that accept bound arguments.
pub trait Parameterized: ExpectationKind {}

/// Expects `begin` / `begin_with`.
#[derive(Debug)]
pub struct Begin;

/// Expects `commit`.
#[derive(Debug)]
pub struct Commit;

/// Expects `rollback`.
#[derive(Debug)]
pub struct Rollback;

/// Expects `execute`.
#[derive(Debug)]
pub struct Exec;

/// Expects `query`.
#[derive(Debug)]
pub struct Query;

/// Expects `prepare`.
#[derive(Debug)]
pub struct Prepare;

/// Expects `deallocate`.
#[derive(Debug)]
pub struct Deallocate;

/// Expects `deallocate_all`.
#[derive(Debug)]
pub struct DeallocateAll;

/// Expects `ping`.
#[derive(Debug)]
pub struct Ping;

/// Expects `close`.
#[derive(Debug)]
pub struct Close;

/// Expects `copy_from`.
#[derive(Debug)]
pub struct CopyFrom;

impl ExpectationKind for Begin {
    const CALL: CallKind = CallKind::Begin;
}
impl ExpectationKind for Commit {
    const CALL: CallKind = CallKind::Commit;
}
impl ExpectationKind for Rollback {
    const CALL: CallKind = CallKind::Rollback;
}
impl ExpectationKind for Exec {
    const CALL: CallKind = CallKind::Exec;
}
impl ExpectationKind for Query {
    const CALL: CallKind = CallKind::Query;
}
impl ExpectationKind for Prepare {
    const CALL: CallKind = CallKind::Prepare;
}
impl ExpectationKind for Deallocate {
    const CALL: CallKind = CallKind::Deallocate;
}
impl ExpectationKind for DeallocateAll {
    const CALL: CallKind = CallKind::DeallocateAll;
}
impl ExpectationKind for Ping {
    const CALL: CallKind = CallKind::Ping;
}
impl ExpectationKind for Close {
    const CALL: CallKind = CallKind::Close;
}
impl ExpectationKind for CopyFrom {
    const CALL: CallKind = CallKind::CopyFrom;
}

impl Parameterized for Exec {}
impl Parameterized for Query {}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Begin {}
    impl Sealed for super::Commit {}
    impl Sealed for super::Rollback {}
    impl Sealed for super::Exec {}
    impl Sealed for super::Query {}
    impl Sealed for super::Prepare {}
    impl Sealed for super::Deallocate {}
    impl Sealed for super::DeallocateAll {}
    impl Sealed for super::Ping {}
    impl Sealed for super::Close {}
    impl Sealed for super::CopyFrom {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_calls() {
        assert_eq!(Begin::CALL, CallKind::Begin);
        assert_eq!(Exec::CALL.name(), "Exec");
        assert_eq!(CopyFrom::CALL.to_string(), "CopyFrom");
    }
}
