//! Ordered and unordered matching, statement matchers, and concurrent use.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pgmock::{CommandTag, Config, Error, Executor, MockConn, PgConnection, strip_query};
use proptest::prelude::*;

// =============================================================================
// Ordered Mode
// =============================================================================

#[tokio::test]
async fn test_ordered_call_of_wrong_kind_names_next_expectation() {
    let mock = MockConn::new().unwrap();
    mock.expect_begin();

    let err = mock.ping().await.unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("call to Ping()"), "{message}");
    assert!(
        message.contains("next expectation is: ExpectedBegin => expecting call to Begin()"),
        "{message}"
    );
}

#[tokio::test]
async fn test_ordered_statement_mismatch() {
    let mock = MockConn::new().unwrap();
    mock.expect_exec("INSERT INTO product_viewers")
        .will_return_result(CommandTag::new("INSERT", 1));
    mock.expect_exec("UPDATE products")
        .will_return_result(CommandTag::new("UPDATE", 1));

    let err = mock
        .execute("UPDATE products SET views = views + 1", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StatementMismatch { .. }), "{err}");
    assert!(err.to_string().contains("could not match actual sql"));
}

#[tokio::test]
async fn test_clones_share_expectations() {
    let mock = MockConn::new().unwrap();
    mock.expect_ping();
    mock.expect_ping();

    let handle = mock.clone();
    handle.ping().await.unwrap();
    mock.ping().await.unwrap();
    handle.expectations_were_met().unwrap();
}

// =============================================================================
// Unordered Mode
// =============================================================================

#[tokio::test]
async fn test_unordered_from_config() {
    let mock = MockConn::with_config(Config::new().match_in_order(false)).unwrap();
    mock.expect_exec("INSERT INTO product_viewers")
        .will_return_result(CommandTag::new("INSERT", 1));
    mock.expect_exec("UPDATE products")
        .will_return_result(CommandTag::new("UPDATE", 1));

    mock.execute("UPDATE products SET views = views + 1", &[])
        .await
        .unwrap();
    mock.execute("INSERT INTO product_viewers (user_id, product_id) VALUES ($1, $2)", &[
        &1i64, &2i64,
    ])
    .await
    .unwrap();
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_unordered_concurrent_calls() {
    let mock = MockConn::new().unwrap();
    mock.match_expectations_in_order(false);
    for id in 0..8i64 {
        mock.expect_exec("UPDATE products")
            .with_args(&[&id])
            .will_return_result(CommandTag::new("UPDATE", 1));
    }

    let mut handles = Vec::new();
    for id in (0..8i64).rev() {
        let conn = mock.clone();
        handles.push(tokio::spawn(async move {
            conn.execute("UPDATE products SET views = views + 1 WHERE id = $1", &[&id])
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_unordered_unexpected_kind() {
    let mock = MockConn::new().unwrap();
    mock.match_expectations_in_order(false);
    mock.expect_exec("UPDATE products")
        .will_return_result(CommandTag::new("UPDATE", 1));

    let err = mock.ping().await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedCall { next: Some(_), .. }));
}

// =============================================================================
// Statement Matchers
// =============================================================================

#[tokio::test]
async fn test_regex_metacharacters_must_be_escaped() {
    let mock = MockConn::new().unwrap();
    mock.expect_exec(r"UPDATE products SET views = views \+ 1")
        .will_return_result(CommandTag::new("UPDATE", 1));

    mock.execute("UPDATE products SET views = views + 1", &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_regex_fails_the_call() {
    let mock = MockConn::new().unwrap();
    mock.expect_exec("UPDATE products SET views = views + (")
        .will_return_result(CommandTag::new("UPDATE", 1));

    let err = mock
        .execute("UPDATE products SET views = views + 1", &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("could not compile regexp"), "{err}");
}

#[tokio::test]
async fn test_exact_matcher_ignores_whitespace_only() {
    let mock = MockConn::with_config(Config::new().exact_match()).unwrap();
    mock.expect_exec("UPDATE products SET views = views + 1")
        .will_return_result(CommandTag::new("UPDATE", 1))
        .times(2);

    mock.execute("UPDATE products\n    SET views = views + 1", &[])
        .await
        .unwrap();
    let err = mock
        .execute("UPDATE products SET views = views + 1 WHERE id = 1", &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does not equal to expected"));
}

proptest! {
    #[test]
    fn strip_query_is_idempotent(sql in "[a-zA-Z0-9 \t\n=$,()*]{0,64}") {
        let once = strip_query(&sql);
        prop_assert_eq!(strip_query(&once), once.clone());
        prop_assert!(!once.contains("  "));
        prop_assert_eq!(once.trim(), once.as_str());
    }
}
