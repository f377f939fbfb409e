//! `record_stats` against a mock connection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pgmock::{CommandTag, Error, MockConn};
use pgmock_demos::record_stats;
use tokio_test::{assert_err, assert_ok};

fn expect_views_update(mock: &MockConn) {
    mock.expect_exec("UPDATE products")
        .will_return_result(CommandTag::new("UPDATE", 1));
}

#[tokio::test]
async fn test_should_update_stats() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    expect_views_update(&mock);
    mock.expect_exec("INSERT INTO product_viewers")
        .with_args(&[&2i64, &3i64])
        .will_return_result(CommandTag::new("INSERT", 1));
    mock.expect_commit();

    assert_ok!(record_stats(&mock, 2, 3).await);
    assert_ok!(mock.expectations_were_met());
}

#[tokio::test]
async fn test_should_roll_back_stat_updates_on_failure() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    expect_views_update(&mock);
    mock.expect_exec("INSERT INTO product_viewers")
        .with_args(&[&2i64, &3i64])
        .will_return_error(Error::Query("some error".into()));
    mock.expect_rollback();

    let err = assert_err!(record_stats(&mock, 2, 3).await);
    assert!(matches!(err, Error::Query(ref msg) if msg == "some error"));
    assert_ok!(mock.expectations_were_met());
}

#[tokio::test]
async fn test_failed_begin_issues_no_statements() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin()
        .will_return_error(Error::Connection("connection refused".into()));

    assert_err!(record_stats(&mock, 2, 3).await);
    assert_ok!(mock.expectations_were_met());
}

#[tokio::test]
async fn test_failed_commit_is_returned() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    expect_views_update(&mock);
    mock.expect_exec("INSERT INTO product_viewers")
        .will_return_result(CommandTag::new("INSERT", 1));
    mock.expect_commit()
        .will_return_error(Error::server("40001", "could not serialize access"));

    let err = assert_err!(record_stats(&mock, 2, 3).await);
    assert!(err.is_transient());
    assert_ok!(mock.expectations_were_met());
}

#[tokio::test]
async fn test_statement_out_of_order_is_a_contract_violation() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();
    mock.expect_exec("INSERT INTO product_viewers")
        .will_return_result(CommandTag::new("INSERT", 1));
    mock.expect_rollback();

    let err = assert_err!(record_stats(&mock, 2, 3).await);
    assert!(err.is_contract_violation(), "{err}");

    // The insert expectation was never reached.
    let unmet = assert_err!(mock.expectations_were_met());
    assert!(unmet.to_string().contains("INSERT INTO product_viewers"));
}
