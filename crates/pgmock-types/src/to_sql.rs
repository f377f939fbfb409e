//! Trait for converting Rust types to PostgreSQL values.

use crate::error::TypeError;
use crate::value::PgValue;

/// Trait for types that can be bound as statement arguments.
///
/// This trait is implemented for common Rust types to enable
/// type-safe parameter binding in queries.
pub trait ToSql {
    /// Convert this value to a PostgreSQL value.
    fn to_sql(&self) -> Result<PgValue, TypeError>;

    /// Get the PostgreSQL type name for this value.
    fn sql_type(&self) -> &'static str;
}

impl ToSql for PgValue {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(self.clone())
    }

    fn sql_type(&self) -> &'static str {
        self.type_name()
    }
}

impl ToSql for bool {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Bool(*self))
    }

    fn sql_type(&self) -> &'static str {
        "BOOL"
    }
}

// PostgreSQL has no single-byte integer; u8 widens to INT2.
impl ToSql for u8 {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Int2(i16::from(*self)))
    }

    fn sql_type(&self) -> &'static str {
        "INT2"
    }
}

impl ToSql for i16 {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Int2(*self))
    }

    fn sql_type(&self) -> &'static str {
        "INT2"
    }
}

impl ToSql for i32 {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Int4(*self))
    }

    fn sql_type(&self) -> &'static str {
        "INT4"
    }
}

impl ToSql for i64 {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Int8(*self))
    }

    fn sql_type(&self) -> &'static str {
        "INT8"
    }
}

impl ToSql for u32 {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Int8(i64::from(*self)))
    }

    fn sql_type(&self) -> &'static str {
        "INT8"
    }
}

impl ToSql for u64 {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        i64::try_from(*self)
            .map(PgValue::Int8)
            .map_err(|_| TypeError::OutOfRange { target_type: "INT8" })
    }

    fn sql_type(&self) -> &'static str {
        "INT8"
    }
}

impl ToSql for f32 {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Float4(*self))
    }

    fn sql_type(&self) -> &'static str {
        "FLOAT4"
    }
}

impl ToSql for f64 {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Float8(*self))
    }

    fn sql_type(&self) -> &'static str {
        "FLOAT8"
    }
}

impl ToSql for str {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Text(self.to_owned()))
    }

    fn sql_type(&self) -> &'static str {
        "TEXT"
    }
}

impl ToSql for String {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Text(self.clone()))
    }

    fn sql_type(&self) -> &'static str {
        "TEXT"
    }
}

impl ToSql for [u8] {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Bytea(bytes::Bytes::copy_from_slice(self)))
    }

    fn sql_type(&self) -> &'static str {
        "BYTEA"
    }
}

impl ToSql for Vec<u8> {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Bytea(bytes::Bytes::copy_from_slice(self)))
    }

    fn sql_type(&self) -> &'static str {
        "BYTEA"
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        match self {
            Some(v) => v.to_sql(),
            None => Ok(PgValue::Null),
        }
    }

    fn sql_type(&self) -> &'static str {
        match self {
            Some(v) => v.sql_type(),
            None => "NULL",
        }
    }
}

impl<T: ToSql + ?Sized> ToSql for &T {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        (*self).to_sql()
    }

    fn sql_type(&self) -> &'static str {
        (*self).sql_type()
    }
}

#[cfg(feature = "uuid")]
impl ToSql for uuid::Uuid {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Uuid(*self))
    }

    fn sql_type(&self) -> &'static str {
        "UUID"
    }
}

#[cfg(feature = "decimal")]
impl ToSql for rust_decimal::Decimal {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Numeric(*self))
    }

    fn sql_type(&self) -> &'static str {
        "NUMERIC"
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::NaiveDate {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Date(*self))
    }

    fn sql_type(&self) -> &'static str {
        "DATE"
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::NaiveTime {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Time(*self))
    }

    fn sql_type(&self) -> &'static str {
        "TIME"
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::NaiveDateTime {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Timestamp(*self))
    }

    fn sql_type(&self) -> &'static str {
        "TIMESTAMP"
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::DateTime<chrono::Utc> {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::TimestampTz(*self))
    }

    fn sql_type(&self) -> &'static str {
        "TIMESTAMPTZ"
    }
}

#[cfg(feature = "json")]
impl ToSql for serde_json::Value {
    fn to_sql(&self) -> Result<PgValue, TypeError> {
        Ok(PgValue::Json(self.clone()))
    }

    fn sql_type(&self) -> &'static str {
        "JSONB"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_to_sql_i32() {
        let value: i32 = 42;
        assert_eq!(value.to_sql().unwrap(), PgValue::Int4(42));
        assert_eq!(value.sql_type(), "INT4");
    }

    #[test]
    fn test_to_sql_string() {
        let value = "hello".to_string();
        assert_eq!(value.to_sql().unwrap(), PgValue::Text("hello".to_string()));
        assert_eq!(value.sql_type(), "TEXT");
    }

    #[test]
    fn test_to_sql_option() {
        let some: Option<i32> = Some(42);
        assert_eq!(some.to_sql().unwrap(), PgValue::Int4(42));

        let none: Option<i32> = None;
        assert_eq!(none.to_sql().unwrap(), PgValue::Null);
    }

    #[test]
    fn test_to_sql_u64_out_of_range() {
        assert!(matches!(
            u64::MAX.to_sql(),
            Err(TypeError::OutOfRange { target_type: "INT8" })
        ));
        assert_eq!(7u64.to_sql().unwrap(), PgValue::Int8(7));
    }
}
