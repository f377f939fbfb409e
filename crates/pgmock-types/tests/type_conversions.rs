//! Type conversion edge case tests.
//!
//! Tests edge cases for:
//! - NULL handling
//! - Integer width conversions
//! - Text cells coming from CSV fixtures
//! - Argument comparison across widths

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bytes::Bytes;
use pgmock_types::{FromSql, PgValue, ToSql, TypeError};
use proptest::prelude::*;

// ============================================================================
// NULL Handling
// ============================================================================

mod null_handling {
    use super::*;

    #[test]
    fn test_null_to_option_i64() {
        let result = Option::<i64>::from_sql(&PgValue::Null).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_null_to_non_option_fails() {
        assert!(matches!(
            f64::from_sql(&PgValue::Null),
            Err(TypeError::UnexpectedNull)
        ));
    }

    #[test]
    fn test_option_none_binds_null() {
        let none: Option<&str> = None;
        assert!(none.to_sql().unwrap().is_null());
        assert_eq!(none.sql_type(), "NULL");
    }

    #[test]
    fn test_null_never_loosely_equals_value() {
        assert!(!PgValue::Null.loosely_eq(&PgValue::Int4(0)));
        assert!(PgValue::Null.loosely_eq(&PgValue::Null));
    }
}

// ============================================================================
// Integer Widths
// ============================================================================

mod integer_widths {
    use super::*;

    #[test]
    fn test_u8_binds_as_int2() {
        assert_eq!(200u8.to_sql().unwrap(), PgValue::Int2(200));
    }

    #[test]
    fn test_i16_from_int8_in_range() {
        assert_eq!(i16::from_sql(&PgValue::Int8(-12)).unwrap(), -12);
    }

    #[test]
    fn test_i16_from_int4_out_of_range() {
        assert_eq!(
            i16::from_sql(&PgValue::Int4(70_000)).unwrap_err(),
            TypeError::OutOfRange { target_type: "i16" }
        );
    }

    #[test]
    fn test_i64_extremes() {
        assert_eq!(i64::from_sql(&PgValue::Int8(i64::MIN)).unwrap(), i64::MIN);
        assert_eq!(i64::from_sql(&PgValue::Int8(i64::MAX)).unwrap(), i64::MAX);
    }
}

// ============================================================================
// Text Cells
// ============================================================================

mod text_cells {
    use super::*;

    #[test]
    fn test_text_with_whitespace_parses() {
        assert_eq!(i32::from_sql(&PgValue::from(" 7 ")).unwrap(), 7);
    }

    #[test]
    fn test_text_bool_spellings() {
        for s in ["t", "true", "TRUE", "1"] {
            assert!(bool::from_sql(&PgValue::from(s)).unwrap(), "{s}");
        }
        for s in ["f", "false", "FALSE", "0"] {
            assert!(!bool::from_sql(&PgValue::from(s)).unwrap(), "{s}");
        }
        assert!(bool::from_sql(&PgValue::from("maybe")).is_err());
    }

    #[test]
    fn test_text_to_bytes() {
        assert_eq!(
            Vec::<u8>::from_sql(&PgValue::from("ab")).unwrap(),
            b"ab".to_vec()
        );
    }

    #[cfg(feature = "decimal")]
    #[test]
    fn test_text_to_decimal() {
        let d = rust_decimal::Decimal::from_sql(&PgValue::from("10.00")).unwrap();
        assert_eq!(d.to_string(), "10.00");
    }

    #[cfg(feature = "uuid")]
    #[test]
    fn test_text_to_uuid_invalid() {
        assert!(matches!(
            uuid::Uuid::from_sql(&PgValue::from("not-a-uuid")),
            Err(TypeError::InvalidUuid(_))
        ));
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_text_to_date() {
        let d = chrono::NaiveDate::from_sql(&PgValue::from("2024-02-29")).unwrap();
        assert_eq!(d, chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}

// ============================================================================
// Binary Values
// ============================================================================

mod binary_values {
    use super::*;

    #[test]
    fn test_bytes_round_trip_through_value() {
        let value = vec![0u8, 1, 2, 255].to_sql().unwrap();
        assert_eq!(value.type_name(), "BYTEA");
        assert_eq!(
            Bytes::from_sql(&value).unwrap(),
            Bytes::from_static(&[0, 1, 2, 255])
        );
    }

    #[test]
    fn test_empty_bytea_display() {
        assert_eq!(PgValue::Bytea(Bytes::new()).to_string(), "\\x");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_i32_widening_is_lossless(v in any::<i32>()) {
        prop_assert_eq!(i64::from_sql(&v.to_sql().unwrap()).unwrap(), i64::from(v));
        prop_assert!(PgValue::Int4(v).loosely_eq(&PgValue::Int8(i64::from(v))));
    }

    #[test]
    fn prop_i64_text_parses_back(v in any::<i64>()) {
        prop_assert_eq!(i64::from_sql(&PgValue::Text(v.to_string())).unwrap(), v);
    }

    #[test]
    fn prop_string_binding_preserves_text(s in ".*") {
        let bound = s.to_sql().unwrap();
        prop_assert_eq!(bound.as_str(), Some(s.as_str()));
    }
}
