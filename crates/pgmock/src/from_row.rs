//! Row-to-struct mapping.
//!
//! [`FromRow`] converts a [`Row`] into a domain type. Queries that join
//! several tables usually select every column as `<alias>_<column>` so two
//! tables can share column names; [`FromRow::from_row_aliased`] reads a
//! struct back from such a row, and [`columns_aliased`] writes the matching
//! select list.
//!
//! ## Example
//!
//! ```rust
//! use pgmock::{Error, FromRow, Row, aliased_column};
//!
//! struct Order {
//!     id: i64,
//!     status: i32,
//! }
//!
//! impl FromRow for Order {
//!     const COLUMNS: &'static [&'static str] = &["id", "status"];
//!
//!     fn from_row_aliased(row: &Row, alias: &str) -> Result<Self, Error> {
//!         Ok(Self {
//!             id: row.get_by_name(&aliased_column(alias, "id"))?,
//!             status: row.get_by_name(&aliased_column(alias, "status"))?,
//!         })
//!     }
//! }
//!
//! assert_eq!(
//!     pgmock::columns_aliased::<Order>("o"),
//!     "o.id AS o_id, o.status AS o_status"
//! );
//! ```

use crate::error::Error;
use crate::rows::Row;

/// Trait for types that can be built from a database row.
///
/// The `derive` feature provides `#[derive(FromRow)]`, which reads every
/// field by name and honours `#[pgmock(rename, skip, default, flatten)]`.
pub trait FromRow: Sized {
    /// Column names this type reads, before aliasing.
    ///
    /// Used by [`columns_aliased`] to build select lists. Columns read by
    /// flattened fields are not listed.
    const COLUMNS: &'static [&'static str] = &[];

    /// Build `Self` from a row whose columns carry the `<alias>_` prefix.
    ///
    /// An empty alias reads the bare column names.
    fn from_row_aliased(row: &Row, alias: &str) -> Result<Self, Error>;

    /// Build `Self` from a row with unprefixed column names.
    fn from_row(row: &Row) -> Result<Self, Error> {
        Self::from_row_aliased(row, "")
    }
}

/// Name of `column` in a result set selected with `alias`.
///
/// Returns `column` unchanged when `alias` is empty.
#[must_use]
pub fn aliased_column(alias: &str, column: &str) -> String {
    if alias.is_empty() {
        column.to_string()
    } else {
        format!("{alias}_{column}")
    }
}

/// Select list for `T` read through table alias `alias`.
///
/// Produces `alias.col AS alias_col` for every entry of [`FromRow::COLUMNS`].
#[must_use]
pub fn columns_aliased<T: FromRow>(alias: &str) -> String {
    T::COLUMNS
        .iter()
        .map(|column| format!("{alias}.{column} AS {}", aliased_column(alias, column)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extension trait for mapping row iterators to typed results.
pub trait RowIteratorExt: Iterator<Item = Result<Row, Error>> + Sized {
    /// Map each row to type `T` using [`FromRow`].
    fn map_rows<T: FromRow>(self) -> MapRows<Self, T> {
        MapRows {
            inner: self,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<I: Iterator<Item = Result<Row, Error>>> RowIteratorExt for I {}

/// Iterator adapter produced by [`RowIteratorExt::map_rows`].
pub struct MapRows<I, T> {
    inner: I,
    _marker: std::marker::PhantomData<T>,
}

impl<I, T> Iterator for MapRows<I, T>
where
    I: Iterator<Item = Result<Row, Error>>,
    T: FromRow,
{
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|result| result.and_then(|row| T::from_row(&row)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rows::Column;
    use pgmock_types::PgValue;

    #[derive(Debug, PartialEq)]
    struct User {
        id: i64,
        balance: f64,
    }

    impl FromRow for User {
        const COLUMNS: &'static [&'static str] = &["id", "balance"];

        fn from_row_aliased(row: &Row, alias: &str) -> Result<Self, Error> {
            Ok(Self {
                id: row.get_by_name(&aliased_column(alias, "id"))?,
                balance: row.get_by_name(&aliased_column(alias, "balance"))?,
            })
        }
    }

    fn user_row(prefix: &str) -> Row {
        Row::from_values(
            vec![
                Column::new(format!("{prefix}id"), 0, "INT8"),
                Column::new(format!("{prefix}balance"), 1, "FLOAT8"),
            ],
            vec![PgValue::Int8(7), PgValue::Float8(12.5)],
        )
    }

    #[test]
    fn test_aliased_column() {
        assert_eq!(aliased_column("o", "status"), "o_status");
        assert_eq!(aliased_column("", "status"), "status");
    }

    #[test]
    fn test_columns_aliased() {
        assert_eq!(
            columns_aliased::<User>("u"),
            "u.id AS u_id, u.balance AS u_balance"
        );
    }

    #[test]
    fn test_from_row_plain_and_aliased() {
        let plain = User::from_row(&user_row("")).unwrap();
        assert_eq!(plain, User { id: 7, balance: 12.5 });

        let aliased = User::from_row_aliased(&user_row("u_"), "u").unwrap();
        assert_eq!(aliased, plain);
    }

    #[test]
    fn test_from_row_missing_column() {
        let err = User::from_row_aliased(&user_row(""), "u").unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn test_map_rows() {
        let rows: Vec<Result<Row, Error>> = vec![Ok(user_row("")), Err(Error::NoRows)];
        let mapped: Vec<_> = rows.into_iter().map_rows::<User>().collect();
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[0].as_ref().unwrap().id, 7);
        assert!(matches!(mapped[1], Err(Error::NoRows)));
    }
}
