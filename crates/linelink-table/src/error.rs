/// Errors that can occur while building, encoding or decoding tables.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The table has no rows.
    #[error("invalid table: table must have at least one row")]
    Empty,

    /// A row has no cells.
    #[error("invalid table: row {row} is empty")]
    EmptyRow { row: usize },

    /// A row's length differs from the first row's.
    #[error("invalid table: row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The payload is not a structurally valid wire table.
    #[error("malformed table payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A cell could not be parsed as a 64-bit float.
    #[error("cell ({row}, {column}) is not a number: {value:?}")]
    NumberParse {
        row: usize,
        column: usize,
        value: String,
        source: std::num::ParseFloatError,
    },
}

impl TableError {
    /// True for shape violations (no rows, empty row, ragged rows).
    pub fn is_invalid_shape(&self) -> bool {
        matches!(
            self,
            TableError::Empty | TableError::EmptyRow { .. } | TableError::Ragged { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
