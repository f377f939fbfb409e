#![no_main]

use libfuzzer_sys::fuzz_target;
use pgmock_types::{FromSql, PgValue};

fuzz_target!(|data: &str| {
    // CSV cells arrive as TEXT and are parsed on access
    let value = PgValue::Text(data.to_string());

    let _ = bool::from_sql(&value);
    let _ = i16::from_sql(&value);
    let _ = i32::from_sql(&value);
    let _ = i64::from_sql(&value);
    let _ = f64::from_sql(&value);
    let _ = uuid::Uuid::from_sql(&value);
    let _ = rust_decimal::Decimal::from_sql(&value);
    let _ = chrono::NaiveDate::from_sql(&value);
    let _ = chrono::NaiveDateTime::from_sql(&value);

    if let Ok(s) = String::from_sql(&value) {
        assert_eq!(s, data);
    }
});
