//! `cancel_order` against a mock connection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pgmock::{CommandTag, Error, MockConn, MockRows};
use pgmock_demos::{CancelOutcome, ORDER_CANCELLED, cancel_order};
use tokio_test::{assert_err, assert_ok};

const LOCK_QUERY: &str = "SELECT (.+) FROM orders AS o INNER JOIN users AS u (.+) FOR UPDATE";

const PENDING_COLUMNS: &[&str] = &["o_id", "o_status", "o_value", "o_reserved_fee", "u_id", "u_balance"];

fn pending_order() -> MockRows {
    MockRows::new(PENDING_COLUMNS).add_row(&[&1i64, &0i32, &25.75f64, &3.25f64, &2i64, &10.00f64])
}

// =============================================================================
// Status Checks
// =============================================================================

#[tokio::test]
async fn test_should_not_cancel_order_with_non_pending_status() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    mock.expect_query(LOCK_QUERY)
        .with_args(&[&1i64])
        .will_return_rows(MockRows::new(&["o_id", "o_status"]).add_row(&[&1i64, &1i32]));
    mock.expect_rollback();

    let outcome = assert_ok!(cancel_order(&mock, 1).await);
    assert_eq!(outcome, CancelOutcome::NotPending {
        status: ORDER_CANCELLED,
    });
    assert_ok!(mock.expectations_were_met());
}

#[tokio::test]
async fn test_missing_order_rolls_back_with_no_rows() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    mock.expect_query(LOCK_QUERY)
        .with_args(&[&7i64])
        .will_return_rows(MockRows::new(PENDING_COLUMNS));
    mock.expect_rollback();

    let err = assert_err!(cancel_order(&mock, 7).await);
    assert!(matches!(err, Error::NoRows));
    assert_ok!(mock.expectations_were_met());
}

// =============================================================================
// Refunds
// =============================================================================

#[tokio::test]
async fn test_should_refund_user_when_order_is_cancelled() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    mock.expect_query(LOCK_QUERY)
        .with_args(&[&1i64])
        .will_return_rows(pending_order());
    mock.expect_prepare("balance_stmt", "UPDATE users SET balance")
        .expect_exec()
        .with_args(&[&(25.75f64 + 3.25), &2i64])
        .will_return_result(CommandTag::new("UPDATE", 1));
    mock.expect_prepare("order_stmt", "UPDATE orders SET status")
        .expect_exec()
        .with_args(&[&ORDER_CANCELLED, &1i64])
        .will_return_result(CommandTag::new("UPDATE", 1));
    mock.expect_commit();

    let outcome = assert_ok!(cancel_order(&mock, 1).await);
    assert_eq!(outcome, CancelOutcome::Cancelled {
        user_id: 2,
        refund: 29.0,
    });
    assert_ok!(mock.expectations_were_met());
}

#[tokio::test]
async fn test_refund_from_csv_fixture() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    mock.expect_query(LOCK_QUERY)
        .will_return_rows(MockRows::new(PENDING_COLUMNS).from_csv("4, 0, 100.00, 0.50, 8, 0"));
    mock.expect_prepare("balance_stmt", "UPDATE users")
        .expect_exec()
        .with_args(&[&100.5f64, &8i64])
        .will_return_result(CommandTag::new("UPDATE", 1));
    mock.expect_prepare("order_stmt", "UPDATE orders")
        .expect_exec()
        .with_args(&[&ORDER_CANCELLED, &4i64])
        .will_return_result(CommandTag::new("UPDATE", 1));
    mock.expect_commit();

    assert_ok!(cancel_order(&mock, 4).await);
    assert_ok!(mock.expectations_were_met());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_should_rollback_on_error() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    mock.expect_query(LOCK_QUERY)
        .with_args(&[&1i64])
        .will_return_error(Error::Query("Some error".into()));
    mock.expect_rollback();

    let err = assert_err!(cancel_order(&mock, 1).await);
    assert_eq!(err.to_string(), "query error: Some error");
    assert_ok!(mock.expectations_were_met());
}

#[tokio::test]
async fn test_failed_balance_update_rolls_back() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    mock.expect_query(LOCK_QUERY).will_return_rows(pending_order());
    mock.expect_prepare("balance_stmt", "UPDATE users SET balance")
        .expect_exec()
        .will_return_error(Error::server("23514", "balance check violated"));
    mock.expect_rollback();

    let err = assert_err!(cancel_order(&mock, 1).await);
    assert_eq!(err.sqlstate(), Some("23514"));
    assert_ok!(mock.expectations_were_met());
}

#[tokio::test]
async fn test_failed_status_update_rolls_back() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    mock.expect_query(LOCK_QUERY).will_return_rows(pending_order());
    mock.expect_prepare("balance_stmt", "UPDATE users SET balance")
        .expect_exec()
        .will_return_result(CommandTag::new("UPDATE", 1));
    mock.expect_prepare("order_stmt", "UPDATE orders SET status")
        .expect_exec()
        .will_return_result(CommandTag::new("UPDATE", 0));
    mock.expect_rollback();

    let err = assert_err!(cancel_order(&mock, 1).await);
    assert!(err.to_string().contains("expected to update 1 row in orders"), "{err}");
    assert_ok!(mock.expectations_were_met());
}

#[tokio::test]
async fn test_unexpected_commit_is_rejected() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    mock.expect_query(LOCK_QUERY).will_return_rows(pending_order());
    mock.expect_rollback();

    let err = assert_err!(cancel_order(&mock, 1).await);
    assert!(err.is_contract_violation(), "{err}");
    assert_ok!(mock.expectations_were_met());
}
