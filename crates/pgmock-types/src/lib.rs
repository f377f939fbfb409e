//! # pgmock-types
//!
//! PostgreSQL to Rust value mappings and conversions.
//!
//! This crate provides the value model shared by the mock driver: bound
//! statement arguments are converted into [`PgValue`]s through [`ToSql`],
//! and canned row data is read back into Rust types through [`FromSql`].
//!
//! ## Features
//!
//! - `chrono` (default): Enable date/time type support via chrono
//! - `uuid` (default): Enable UUID type support
//! - `decimal` (default): Enable NUMERIC support via rust_decimal
//! - `json`: Enable JSONB support via serde_json
//!
//! ## Type Mappings
//!
//! | PostgreSQL Type | Rust Type |
//! |-----------------|-----------|
//! | `BOOL` | `bool` |
//! | `INT2` | `i16` (also `u8`) |
//! | `INT4` | `i32` |
//! | `INT8` | `i64` |
//! | `FLOAT4` | `f32` |
//! | `FLOAT8` | `f64` |
//! | `NUMERIC` | `rust_decimal::Decimal` |
//! | `TEXT`/`VARCHAR` | `String` |
//! | `BYTEA` | `Vec<u8>` / `bytes::Bytes` |
//! | `DATE` | `chrono::NaiveDate` |
//! | `TIME` | `chrono::NaiveTime` |
//! | `TIMESTAMP` | `chrono::NaiveDateTime` |
//! | `TIMESTAMPTZ` | `chrono::DateTime<chrono::Utc>` |
//! | `UUID` | `uuid::Uuid` |
//! | `JSONB` | `serde_json::Value` |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod from_sql;
pub mod to_sql;
pub mod value;

pub use error::TypeError;
pub use from_sql::FromSql;
pub use to_sql::ToSql;
pub use value::PgValue;
