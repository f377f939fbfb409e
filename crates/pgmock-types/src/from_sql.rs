//! Trait for converting from PostgreSQL values to Rust types.
//!
//! Canned rows built from CSV carry every cell as `TEXT`, the same way the
//! text protocol delivers them, so the numeric and boolean conversions also
//! accept text and parse it.

use std::str::FromStr;

use crate::error::TypeError;
use crate::value::PgValue;

/// Trait for types that can be read out of a result cell.
pub trait FromSql: Sized {
    /// Convert from a PostgreSQL value to this type.
    fn from_sql(value: &PgValue) -> Result<Self, TypeError>;

    /// Convert from an optional PostgreSQL value.
    ///
    /// Returns `None` if the value is NULL.
    fn from_sql_nullable(value: &PgValue) -> Result<Option<Self>, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            Self::from_sql(value).map(Some)
        }
    }
}

fn mismatch(expected: &'static str, value: &PgValue) -> TypeError {
    TypeError::TypeMismatch {
        expected,
        actual: value.type_name().to_string(),
    }
}

fn parse_text<T: FromStr>(text: &str, expected: &'static str) -> Result<T, TypeError> {
    text.trim().parse().map_err(|_| TypeError::TypeMismatch {
        expected,
        actual: format!("TEXT '{text}'"),
    })
}

impl FromSql for PgValue {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        Ok(value.clone())
    }
}

impl FromSql for bool {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Bool(v) => Ok(*v),
            PgValue::Text(s) => match s.trim() {
                "t" | "true" | "TRUE" | "1" => Ok(true),
                "f" | "false" | "FALSE" | "0" => Ok(false),
                _ => Err(TypeError::TypeMismatch {
                    expected: "bool",
                    actual: format!("TEXT '{s}'"),
                }),
            },
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl FromSql for i16 {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Int2(v) => Ok(*v),
            PgValue::Int4(v) => {
                i16::try_from(*v).map_err(|_| TypeError::OutOfRange { target_type: "i16" })
            }
            PgValue::Int8(v) => {
                i16::try_from(*v).map_err(|_| TypeError::OutOfRange { target_type: "i16" })
            }
            PgValue::Text(s) => parse_text(s, "i16"),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("i16", value)),
        }
    }
}

impl FromSql for i32 {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Int4(v) => Ok(*v),
            PgValue::Int2(v) => Ok(i32::from(*v)),
            PgValue::Int8(v) => {
                i32::try_from(*v).map_err(|_| TypeError::OutOfRange { target_type: "i32" })
            }
            PgValue::Text(s) => parse_text(s, "i32"),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("i32", value)),
        }
    }
}

impl FromSql for i64 {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Int8(v) => Ok(*v),
            PgValue::Int4(v) => Ok(i64::from(*v)),
            PgValue::Int2(v) => Ok(i64::from(*v)),
            PgValue::Text(s) => parse_text(s, "i64"),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("i64", value)),
        }
    }
}

impl FromSql for f32 {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Float4(v) => Ok(*v),
            PgValue::Text(s) => parse_text(s, "f32"),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("f32", value)),
        }
    }
}

impl FromSql for f64 {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Float8(v) => Ok(*v),
            PgValue::Float4(v) => Ok(f64::from(*v)),
            PgValue::Int4(v) => Ok(f64::from(*v)),
            PgValue::Int2(v) => Ok(f64::from(*v)),
            #[cfg(feature = "decimal")]
            PgValue::Numeric(v) => {
                use rust_decimal::prelude::ToPrimitive;
                v.to_f64()
                    .ok_or(TypeError::OutOfRange { target_type: "f64" })
            }
            PgValue::Text(s) => parse_text(s, "f64"),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("f64", value)),
        }
    }
}

impl FromSql for String {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Text(v) => Ok(v.clone()),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromSql for Vec<u8> {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Bytea(v) => Ok(v.to_vec()),
            PgValue::Text(s) => Ok(s.as_bytes().to_vec()),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("Vec<u8>", value)),
        }
    }
}

impl FromSql for bytes::Bytes {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Bytea(v) => Ok(v.clone()),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("Bytes", value)),
        }
    }
}

impl<T: FromSql> FromSql for Option<T> {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        T::from_sql_nullable(value)
    }
}

#[cfg(feature = "uuid")]
impl FromSql for uuid::Uuid {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Uuid(v) => Ok(*v),
            PgValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| TypeError::InvalidUuid(format!("{e}"))),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("Uuid", value)),
        }
    }
}

#[cfg(feature = "decimal")]
impl FromSql for rust_decimal::Decimal {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Numeric(v) => Ok(*v),
            PgValue::Int2(v) => Ok(rust_decimal::Decimal::from(*v)),
            PgValue::Int4(v) => Ok(rust_decimal::Decimal::from(*v)),
            PgValue::Int8(v) => Ok(rust_decimal::Decimal::from(*v)),
            PgValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| TypeError::InvalidDecimal(format!("{e}"))),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("Decimal", value)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveDate {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Date(v) => Ok(*v),
            PgValue::Timestamp(v) => Ok(v.date()),
            PgValue::Text(s) => chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|e| TypeError::InvalidDateTime(format!("{e}"))),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("NaiveDate", value)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveTime {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Time(v) => Ok(*v),
            PgValue::Timestamp(v) => Ok(v.time()),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("NaiveTime", value)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveDateTime {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Timestamp(v) => Ok(*v),
            PgValue::TimestampTz(v) => Ok(v.naive_utc()),
            PgValue::Text(s) => chrono::NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S%.f")
                .map_err(|e| TypeError::InvalidDateTime(format!("{e}"))),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("NaiveDateTime", value)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::DateTime<chrono::Utc> {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::TimestampTz(v) => Ok(*v),
            PgValue::Timestamp(v) => Ok(chrono::DateTime::from_naive_utc_and_offset(
                *v,
                chrono::Utc,
            )),
            PgValue::Null => Err(TypeError::UnexpectedNull),
            _ => Err(mismatch("DateTime<Utc>", value)),
        }
    }
}

#[cfg(feature = "json")]
impl FromSql for serde_json::Value {
    fn from_sql(value: &PgValue) -> Result<Self, TypeError> {
        match value {
            PgValue::Json(v) => Ok(v.clone()),
            PgValue::Text(s) => serde_json::from_str(s).map_err(|e| TypeError::TypeMismatch {
                expected: "JSON",
                actual: format!("invalid JSON: {e}"),
            }),
            PgValue::Null => Ok(serde_json::Value::Null),
            _ => Err(mismatch("JSON", value)),
        }
    }
}
