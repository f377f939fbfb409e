//! Canned result sets and row access.
//!
//! [`MockRows`] is the builder a test uses to declare what a query returns.
//! When an expectation fires, the mock turns it into a [`Rows`] iterator
//! that application code consumes exactly as it would a live result set.
//!
//! All rows of one result set share a single [`ColMetaData`] through an
//! `Arc`, and each [`Row`] holds its cells in an `Arc<[PgValue]>` so clones
//! are cheap.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pgmock_types::{FromSql, PgValue, ToSql, TypeError};

use crate::error::{Error, Result};

/// Column metadata describing a result set column.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column index (0-based).
    pub index: usize,
    /// PostgreSQL type name (e.g., "INT8", "TEXT").
    ///
    /// Mock columns start out as `UNKNOWN` and take the type of the first
    /// non-NULL value added to them.
    pub type_name: String,
    /// Whether the column has held a NULL value.
    pub nullable: bool,
}

impl Column {
    /// Create a new column with basic metadata.
    pub fn new(name: impl Into<String>, index: usize, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index,
            type_name: type_name.into(),
            nullable: false,
        }
    }

    /// Set whether the column is nullable.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Column metadata shared by every row of a result set.
#[derive(Debug, Clone)]
pub struct ColMetaData {
    /// Column definitions.
    pub columns: Arc<[Column]>,
}

impl ColMetaData {
    /// Create new column metadata from a list of columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns: columns.into(),
        }
    }

    /// Get the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get a column by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Find a column index by name (case-insensitive).
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Builder for a canned result set.
///
/// # Example
///
/// ```rust
/// use pgmock::MockRows;
///
/// let rows = MockRows::new(&["o_id", "o_status"])
///     .add_row(&[&1i64, &0i32])
///     .add_row(&[&2i64, &1i32]);
/// assert_eq!(rows.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockRows {
    columns: Vec<Column>,
    rows: Vec<Vec<PgValue>>,
    row_errors: BTreeMap<usize, Error>,
    close_error: Option<Error>,
    invalid: Option<String>,
}

impl MockRows {
    /// Create an empty result set with the given column names.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns
                .iter()
                .enumerate()
                .map(|(i, name)| Column::new(*name, i, "UNKNOWN"))
                .collect(),
            rows: Vec::new(),
            row_errors: BTreeMap::new(),
            close_error: None,
            invalid: None,
        }
    }

    /// Append one row, converting each value with [`ToSql`].
    #[must_use]
    pub fn add_row(mut self, values: &[&(dyn ToSql + Sync)]) -> Self {
        let converted: std::result::Result<Vec<PgValue>, TypeError> =
            values.iter().map(|v| v.to_sql()).collect();
        match converted {
            Ok(row) => self.push_row(row),
            Err(e) => self.mark_invalid(format!("row {}: {e}", self.rows.len())),
        }
        self
    }

    /// Append several rows at once.
    #[must_use]
    pub fn add_rows(self, rows: &[&[&(dyn ToSql + Sync)]]) -> Self {
        rows.iter().fold(self, |acc, row| acc.add_row(row))
    }

    /// Append one row of already converted values.
    #[must_use]
    pub fn add_raw_row(mut self, values: Vec<PgValue>) -> Self {
        self.push_row(values);
        self
    }

    /// Append rows parsed from CSV text, one row per line.
    ///
    /// Cells are trimmed and stored as `TEXT`; the literal `NULL` becomes SQL
    /// NULL. Typed access through [`Row::get`] parses the text on demand.
    #[must_use]
    #[allow(clippy::wrong_self_convention)]
    pub fn from_csv(mut self, text: &str) -> Self {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        for record in reader.records() {
            match record {
                Ok(record) => {
                    let row = record
                        .iter()
                        .map(|cell| {
                            if cell == "NULL" {
                                PgValue::Null
                            } else {
                                PgValue::Text(cell.to_string())
                            }
                        })
                        .collect();
                    self.push_row(row);
                }
                Err(e) => {
                    self.mark_invalid(format!("invalid CSV: {e}"));
                    break;
                }
            }
        }
        self
    }

    /// Make iteration fail with `err` when it reaches row `index`.
    ///
    /// Rows before `index` are yielded normally and iteration stops after
    /// the error.
    #[must_use]
    pub fn row_error(mut self, index: usize, err: Error) -> Self {
        self.row_errors.insert(index, err);
        self
    }

    /// Make [`Rows::close`] return `err`.
    #[must_use]
    pub fn close_error(mut self, err: Error) -> Self {
        self.close_error = Some(err);
        self
    }

    /// Number of rows declared so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no rows were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column metadata of this result set.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Check that every row matches the column count.
    pub fn validate(&self) -> Result<()> {
        match &self.invalid {
            Some(reason) => Err(Error::Config(format!("invalid mock rows: {reason}"))),
            None => Ok(()),
        }
    }

    pub(crate) fn into_rows(self, closed: Option<Arc<AtomicBool>>) -> Result<Rows> {
        self.validate()?;
        Ok(Rows {
            metadata: Arc::new(ColMetaData::new(self.columns)),
            rows: self.rows.into_iter(),
            position: 0,
            row_errors: self.row_errors,
            close_error: self.close_error,
            closed,
            done: false,
        })
    }

    fn push_row(&mut self, row: Vec<PgValue>) {
        if row.len() != self.columns.len() {
            self.mark_invalid(format!(
                "row {} has {} values but there are {} columns",
                self.rows.len(),
                row.len(),
                self.columns.len()
            ));
            return;
        }
        for (column, value) in self.columns.iter_mut().zip(&row) {
            if value.is_null() {
                column.nullable = true;
            } else if column.type_name == "UNKNOWN" {
                column.type_name = value.type_name().to_string();
            }
        }
        self.rows.push(row);
    }

    fn mark_invalid(&mut self, reason: String) {
        if self.invalid.is_none() {
            self.invalid = Some(reason);
        }
    }
}

/// A result set returned by a query.
///
/// Iterating yields one `Result<Row>` per row. A declared row error is
/// yielded in place of its row and ends the iteration.
///
/// Dropping the set counts as closing it; call [`Rows::close`] to observe a
/// declared close error.
#[derive(Debug)]
pub struct Rows {
    metadata: Arc<ColMetaData>,
    rows: std::vec::IntoIter<Vec<PgValue>>,
    position: usize,
    row_errors: BTreeMap<usize, Error>,
    close_error: Option<Error>,
    closed: Option<Arc<AtomicBool>>,
    done: bool,
}

impl Rows {
    /// Column metadata of this result set.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.metadata.columns
    }

    /// Close the result set, returning the declared close error if any.
    pub fn close(mut self) -> Result<()> {
        self.mark_closed();
        match self.close_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn mark_closed(&self) {
        if let Some(flag) = &self.closed {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

impl Iterator for Rows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(err) = self.row_errors.remove(&self.position) {
            self.done = true;
            return Some(Err(err));
        }
        match self.rows.next() {
            Some(values) => {
                self.position += 1;
                Some(Ok(Row {
                    values: values.into(),
                    metadata: Arc::clone(&self.metadata),
                }))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl Drop for Rows {
    fn drop(&mut self) {
        self.mark_closed();
    }
}

/// A row from a query result.
#[derive(Clone)]
pub struct Row {
    values: Arc<[PgValue]>,
    metadata: Arc<ColMetaData>,
}

impl Row {
    /// Create a row from column definitions and values.
    pub fn from_values(columns: Vec<Column>, values: Vec<PgValue>) -> Self {
        Self {
            values: values.into(),
            metadata: Arc::new(ColMetaData::new(columns)),
        }
    }

    /// Get a value by column index with type conversion.
    pub fn get<T: FromSql>(&self, index: usize) -> std::result::Result<T, TypeError> {
        self.values
            .get(index)
            .ok_or_else(|| TypeError::TypeMismatch {
                expected: "valid column index",
                actual: format!("index {index} out of bounds"),
            })
            .and_then(T::from_sql)
    }

    /// Get a value by column name with type conversion.
    pub fn get_by_name<T: FromSql>(&self, name: &str) -> std::result::Result<T, TypeError> {
        let index = self
            .metadata
            .find_by_name(name)
            .ok_or_else(|| TypeError::ColumnNotFound(name.to_string()))?;
        self.get(index)
    }

    /// Try to get a value by column index, returning None if NULL or not found.
    pub fn try_get<T: FromSql>(&self, index: usize) -> Option<T> {
        self.values
            .get(index)
            .and_then(|v| T::from_sql_nullable(v).ok().flatten())
    }

    /// Try to get a value by column name, returning None if NULL or not found.
    pub fn try_get_by_name<T: FromSql>(&self, name: &str) -> Option<T> {
        let index = self.metadata.find_by_name(name)?;
        self.try_get(index)
    }

    /// Get the raw value by index.
    #[must_use]
    pub fn get_raw(&self, index: usize) -> Option<&PgValue> {
        self.values.get(index)
    }

    /// Get the raw value by column name.
    #[must_use]
    pub fn get_raw_by_name(&self, name: &str) -> Option<&PgValue> {
        let index = self.metadata.find_by_name(name)?;
        self.values.get(index)
    }

    /// Check if a column value is NULL. Missing columns count as NULL.
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.values.get(index).is_none_or(PgValue::is_null)
    }

    /// Get the number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the column metadata.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.metadata.columns
    }

    /// Iterate over the raw values.
    pub fn values(&self) -> impl Iterator<Item = &PgValue> {
        self.values.iter()
    }
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (column, value) in self.metadata.columns.iter().zip(self.values.iter()) {
            map.entry(&column.name, value);
        }
        map.finish()
    }
}
