use crate::error::{Result, TableError};

/// A rectangular, non-empty grid of `f64` values.
///
/// Construction validates the shape, so every `Table` value has at least one
/// row, at least one column, and rows of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    rows: Vec<Vec<f64>>,
}

impl Table {
    /// Build a table from rows, rejecting empty or non-rectangular input.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        check_shape(&rows)?;
        Ok(Self { rows })
    }

    /// Build a table from a row-major buffer split into rows of `columns` cells.
    pub fn from_row_major(values: &[f64], columns: usize) -> Result<Self> {
        if values.is_empty() {
            return Err(TableError::Empty);
        }
        if columns == 0 {
            return Err(TableError::EmptyRow { row: 0 });
        }
        Self::new(values.chunks(columns).map(<[f64]>::to_vec).collect())
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows[0].len()
    }

    /// `(rows, columns)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(column)).copied()
    }

    /// Flatten into a row-major buffer.
    pub fn to_row_major(&self) -> Vec<f64> {
        self.rows.iter().flatten().copied().collect()
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }

    /// Compare cell bit patterns, so `NaN` equals an identical `NaN` and
    /// `0.0` differs from `-0.0`.
    pub fn bits_eq(&self, other: &Table) -> bool {
        self.dims() == other.dims()
            && self
                .rows
                .iter()
                .flatten()
                .zip(other.rows.iter().flatten())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl TryFrom<Vec<Vec<f64>>> for Table {
    type Error = TableError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<Table> for Vec<Vec<f64>> {
    fn from(table: Table) -> Self {
        table.into_rows()
    }
}

/// Validate the rectangularity invariant and return the column count.
pub(crate) fn check_shape<T>(rows: &[Vec<T>]) -> Result<usize> {
    let first = rows.first().ok_or(TableError::Empty)?;
    let expected = first.len();
    if expected == 0 {
        return Err(TableError::EmptyRow { row: 0 });
    }

    for (row, cells) in rows.iter().enumerate().skip(1) {
        if cells.is_empty() {
            return Err(TableError::EmptyRow { row });
        }
        if cells.len() != expected {
            return Err(TableError::Ragged {
                row,
                expected,
                found: cells.len(),
            });
        }
    }

    Ok(expected)
}
