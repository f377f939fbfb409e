//! Result set tests: canned rows, typed access, row and close errors.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pgmock::{Error, Executor, FromRow, MockConn, MockRows, Row, RowIteratorExt, aliased_column};

#[derive(Debug, PartialEq)]
struct Viewer {
    user_id: i64,
    product_id: i64,
}

impl FromRow for Viewer {
    const COLUMNS: &'static [&'static str] = &["user_id", "product_id"];

    fn from_row_aliased(row: &Row, alias: &str) -> Result<Self, Error> {
        Ok(Self {
            user_id: row.get_by_name(&aliased_column(alias, "user_id"))?,
            product_id: row.get_by_name(&aliased_column(alias, "product_id"))?,
        })
    }
}

fn viewers() -> MockRows {
    MockRows::new(&["user_id", "product_id"])
        .add_row(&[&1i64, &10i64])
        .add_row(&[&2i64, &20i64])
        .add_row(&[&3i64, &30i64])
}

// =============================================================================
// Iteration
// =============================================================================

#[tokio::test]
async fn test_query_returns_declared_rows() {
    let mock = MockConn::new().unwrap();
    mock.expect_query("SELECT (.+) FROM product_viewers")
        .will_return_rows(viewers());

    let rows = mock
        .query("SELECT user_id, product_id FROM product_viewers", &[])
        .await
        .unwrap();
    assert_eq!(rows.columns().len(), 2);
    assert_eq!(rows.columns()[0].type_name, "INT8");

    let viewers: Vec<Viewer> = rows.map_rows::<Viewer>().collect::<Result<_, _>>().unwrap();
    assert_eq!(viewers.len(), 3);
    assert_eq!(viewers[2], Viewer {
        user_id: 3,
        product_id: 30,
    });
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_row_error_stops_iteration() {
    let mock = MockConn::new().unwrap();
    mock.expect_query("SELECT (.+) FROM product_viewers")
        .will_return_rows(viewers().row_error(1, Error::Query("row 1 is broken".into())));

    let rows = mock
        .query("SELECT * FROM product_viewers", &[])
        .await
        .unwrap();
    let results: Vec<_> = rows.collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::Query(_))));
}

#[tokio::test]
async fn test_close_error_is_reported() {
    let mock = MockConn::new().unwrap();
    mock.expect_query("SELECT")
        .will_return_rows(viewers().close_error(Error::Query("close failed".into())));

    let mut rows = mock.query("SELECT 1", &[]).await.unwrap();
    assert!(rows.next().is_some());
    assert!(matches!(rows.close(), Err(Error::Query(_))));
}

#[tokio::test]
async fn test_rows_will_be_closed() {
    let mock = MockConn::new().unwrap();
    mock.expect_query("SELECT")
        .will_return_rows(viewers())
        .rows_will_be_closed();

    let rows = mock.query("SELECT 1", &[]).await.unwrap();
    let err = mock.expectations_were_met().unwrap_err();
    assert!(err.to_string().contains("returned row sets were not closed"), "{err}");

    rows.close().unwrap();
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_rows_will_be_closed_counts_every_trigger() {
    let mock = MockConn::new().unwrap();
    mock.expect_query("SELECT")
        .will_return_rows(viewers())
        .rows_will_be_closed()
        .times(2);

    let first = mock.query("SELECT 1", &[]).await.unwrap();
    let second = mock.query("SELECT 1", &[]).await.unwrap();
    first.close().unwrap();

    let err = mock.expectations_were_met().unwrap_err();
    assert!(err.to_string().contains("1 of 2 returned row sets"), "{err}");

    drop(second);
    mock.expectations_were_met().unwrap();
}

#[tokio::test]
async fn test_query_one_on_empty_result() {
    let mock = MockConn::new().unwrap();
    mock.expect_query("SELECT")
        .will_return_rows(MockRows::new(&["id"]));

    let err = mock.query_one("SELECT id FROM orders", &[]).await.unwrap_err();
    assert!(matches!(err, Error::NoRows));
}

#[tokio::test]
async fn test_query_without_rows_is_config_error() {
    let mock = MockConn::new().unwrap();
    mock.expect_query("SELECT");

    let err = mock.query("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

// =============================================================================
// Construction
// =============================================================================

#[tokio::test]
async fn test_mismatched_row_width_is_config_error() {
    let mock = MockConn::new().unwrap();
    mock.expect_query("SELECT")
        .will_return_rows(MockRows::new(&["a", "b"]).add_row(&[&1i32]));

    let err = mock.query("SELECT a, b FROM t", &[]).await.unwrap_err();
    assert!(err.to_string().contains("invalid mock rows"), "{err}");
}

#[test]
fn test_csv_rows() {
    let rows = MockRows::new(&["id", "status", "note"]).from_csv("1, 0, first\n2, 1, NULL\n");
    assert_eq!(rows.len(), 2);
    rows.validate().unwrap();
}

#[tokio::test]
async fn test_csv_rows_parse_on_access() {
    let mock = MockConn::new().unwrap();
    let rows = mock
        .new_rows(&["id", "balance", "note"])
        .from_csv("7, 12.50, NULL");
    mock.expect_query("SELECT").will_return_rows(rows);

    let row = mock.query_one("SELECT * FROM users", &[]).await.unwrap();
    assert_eq!(row.get::<i64>(0).unwrap(), 7);
    assert!((row.get::<f64>(1).unwrap() - 12.5).abs() < f64::EPSILON);
    assert!(row.is_null(2));
    assert_eq!(row.get::<Option<String>>(2).unwrap(), None);
}

#[test]
fn test_add_rows_batch() {
    let first: &[&(dyn pgmock::ToSql + Sync)] = &[&1i64, &"a"];
    let second: &[&(dyn pgmock::ToSql + Sync)] = &[&2i64, &"b"];
    let rows = MockRows::new(&["id", "name"]).add_rows(&[first, second]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.columns()[1].type_name, "TEXT");
}
