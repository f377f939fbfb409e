//! PostgreSQL value representation.

use std::fmt;

use bytes::Bytes;

/// A SQL value that can represent any supported PostgreSQL data type.
///
/// Bound statement arguments and canned row cells are both carried as
/// `PgValue`s, so expectations can compare what a caller sent with what a
/// test declared.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PgValue {
    /// NULL value.
    #[default]
    Null,
    /// Boolean value (BOOL).
    Bool(bool),
    /// 16-bit signed integer (INT2 / SMALLINT).
    Int2(i16),
    /// 32-bit signed integer (INT4 / INTEGER).
    Int4(i32),
    /// 64-bit signed integer (INT8 / BIGINT).
    Int8(i64),
    /// 32-bit floating point (FLOAT4 / REAL).
    Float4(f32),
    /// 64-bit floating point (FLOAT8 / DOUBLE PRECISION).
    Float8(f64),
    /// String value (TEXT, VARCHAR, CHAR).
    Text(String),
    /// Binary value (BYTEA).
    Bytea(Bytes),
    /// Arbitrary precision number (NUMERIC).
    #[cfg(feature = "decimal")]
    Numeric(rust_decimal::Decimal),
    /// UUID value (UUID).
    #[cfg(feature = "uuid")]
    Uuid(uuid::Uuid),
    /// Date value (DATE).
    #[cfg(feature = "chrono")]
    Date(chrono::NaiveDate),
    /// Time value (TIME).
    #[cfg(feature = "chrono")]
    Time(chrono::NaiveTime),
    /// Timestamp without time zone (TIMESTAMP).
    #[cfg(feature = "chrono")]
    Timestamp(chrono::NaiveDateTime),
    /// Timestamp with time zone (TIMESTAMPTZ).
    #[cfg(feature = "chrono")]
    TimestampTz(chrono::DateTime<chrono::Utc>),
    /// JSON document (JSON / JSONB).
    #[cfg(feature = "json")]
    Json(serde_json::Value),
}

impl PgValue {
    /// Check if the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the value as a bool, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an i32, if it is an integer that fits.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int4(v) => Some(*v),
            Self::Int2(v) => Some(i32::from(*v)),
            Self::Int8(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Get the value as an i64, if it is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int8(v) => Some(*v),
            Self::Int4(v) => Some(i64::from(*v)),
            Self::Int2(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as an f64, if it is a floating point number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float8(v) => Some(*v),
            Self::Float4(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as bytes, if it is binary.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytea(v) => Some(v),
            _ => None,
        }
    }

    /// Compare two values the way a driver would see them on the wire.
    ///
    /// Integers compare equal across widths (`INT4 1` equals `INT8 1`) and
    /// floating point values compare across widths. Everything else uses
    /// structural equality.
    #[must_use]
    pub fn loosely_eq(&self, other: &PgValue) -> bool {
        if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a == b;
        }
        self == other
    }

    /// Get the PostgreSQL type name as a string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOL",
            Self::Int2(_) => "INT2",
            Self::Int4(_) => "INT4",
            Self::Int8(_) => "INT8",
            Self::Float4(_) => "FLOAT4",
            Self::Float8(_) => "FLOAT8",
            Self::Text(_) => "TEXT",
            Self::Bytea(_) => "BYTEA",
            #[cfg(feature = "decimal")]
            Self::Numeric(_) => "NUMERIC",
            #[cfg(feature = "uuid")]
            Self::Uuid(_) => "UUID",
            #[cfg(feature = "chrono")]
            Self::Date(_) => "DATE",
            #[cfg(feature = "chrono")]
            Self::Time(_) => "TIME",
            #[cfg(feature = "chrono")]
            Self::Timestamp(_) => "TIMESTAMP",
            #[cfg(feature = "chrono")]
            Self::TimestampTz(_) => "TIMESTAMPTZ",
            #[cfg(feature = "json")]
            Self::Json(_) => "JSONB",
        }
    }
}

impl fmt::Display for PgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int2(v) => write!(f, "{v}"),
            Self::Int4(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Float4(v) => write!(f, "{v}"),
            Self::Float8(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
            Self::Bytea(v) => {
                f.write_str("\\x")?;
                for b in v.iter() {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            #[cfg(feature = "decimal")]
            Self::Numeric(v) => write!(f, "{v}"),
            #[cfg(feature = "uuid")]
            Self::Uuid(v) => write!(f, "'{v}'"),
            #[cfg(feature = "chrono")]
            Self::Date(v) => write!(f, "'{v}'"),
            #[cfg(feature = "chrono")]
            Self::Time(v) => write!(f, "'{v}'"),
            #[cfg(feature = "chrono")]
            Self::Timestamp(v) => write!(f, "'{v}'"),
            #[cfg(feature = "chrono")]
            Self::TimestampTz(v) => write!(f, "'{v}'"),
            #[cfg(feature = "json")]
            Self::Json(v) => write!(f, "'{v}'"),
        }
    }
}

impl From<bool> for PgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for PgValue {
    fn from(v: i16) -> Self {
        Self::Int2(v)
    }
}

impl From<i32> for PgValue {
    fn from(v: i32) -> Self {
        Self::Int4(v)
    }
}

impl From<i64> for PgValue {
    fn from(v: i64) -> Self {
        Self::Int8(v)
    }
}

impl From<f32> for PgValue {
    fn from(v: f32) -> Self {
        Self::Float4(v)
    }
}

impl From<f64> for PgValue {
    fn from(v: f64) -> Self {
        Self::Float8(v)
    }
}

impl From<String> for PgValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for PgValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Bytes> for PgValue {
    fn from(v: Bytes) -> Self {
        Self::Bytea(v)
    }
}

impl From<Vec<u8>> for PgValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytea(Bytes::from(v))
    }
}

impl<T> From<Option<T>> for PgValue
where
    T: Into<PgValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(feature = "uuid")]
impl From<uuid::Uuid> for PgValue {
    fn from(v: uuid::Uuid) -> Self {
        Self::Uuid(v)
    }
}

#[cfg(feature = "decimal")]
impl From<rust_decimal::Decimal> for PgValue {
    fn from(v: rust_decimal::Decimal) -> Self {
        Self::Numeric(v)
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveDate> for PgValue {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Date(v)
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveDateTime> for PgValue {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::DateTime<chrono::Utc>> for PgValue {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Self::TimestampTz(v)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Value> for PgValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loosely_eq_integer_widths() {
        assert!(PgValue::Int4(1).loosely_eq(&PgValue::Int8(1)));
        assert!(PgValue::Int2(7).loosely_eq(&PgValue::Int4(7)));
        assert!(!PgValue::Int4(1).loosely_eq(&PgValue::Int8(2)));
    }

    #[test]
    fn test_loosely_eq_float_widths() {
        assert!(PgValue::Float4(25.75).loosely_eq(&PgValue::Float8(25.75)));
        assert!(PgValue::Float8(25.75 + 3.25).loosely_eq(&PgValue::Float8(29.0)));
    }

    #[test]
    fn test_loosely_eq_does_not_mix_ints_and_floats() {
        assert!(!PgValue::Int4(29).loosely_eq(&PgValue::Float8(29.0)));
    }

    #[test]
    fn test_display() {
        assert_eq!(PgValue::Null.to_string(), "NULL");
        assert_eq!(PgValue::Int8(42).to_string(), "42");
        assert_eq!(PgValue::from("abc").to_string(), "'abc'");
        assert_eq!(PgValue::from(vec![0xde, 0xad]).to_string(), "\\xdead");
    }

    #[test]
    fn test_option_into_null() {
        let none: Option<i32> = None;
        assert!(PgValue::from(none).is_null());
        assert_eq!(PgValue::from(Some(3i32)), PgValue::Int4(3));
    }
}
