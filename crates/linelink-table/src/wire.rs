use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TableError};
use crate::table::{check_shape, Table};

/// Structured form of a table on the wire: a row-major grid of numeric strings.
///
/// ```text
/// {"data":[["1e0","2e0"],["3e0","4e0"]]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTable {
    pub data: Vec<Vec<String>>,
}

/// Render a cell in exponential notation with the shortest digits that
/// reparse to the identical `f64`.
pub fn format_cell(value: f64) -> String {
    format!("{value:e}")
}

/// Parse a cell; accepts `1e0`, `1E+00`, `inf`, `NaN` and plain decimals.
pub fn parse_cell(row: usize, column: usize, text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|source| TableError::NumberParse {
            row,
            column,
            value: text.to_string(),
            source,
        })
}

impl From<&Table> for WireTable {
    fn from(table: &Table) -> Self {
        Self {
            data: render(table.rows()),
        }
    }
}

impl TryFrom<WireTable> for Table {
    type Error = TableError;

    fn try_from(wire: WireTable) -> Result<Self> {
        check_shape(&wire.data)?;

        let rows = wire
            .data
            .iter()
            .enumerate()
            .map(|(r, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(|(c, text)| parse_cell(r, c, text))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Table::new(rows)
    }
}

/// Encode a table into a frame payload.
pub fn serialize(table: &Table) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(&WireTable::from(table))?;
    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        size = payload.len(),
        "serialized table"
    );
    Ok(payload)
}

/// Validate and encode raw rows into a frame payload.
pub fn serialize_rows(rows: &[Vec<f64>]) -> Result<Vec<u8>> {
    check_shape(rows)?;
    let payload = serde_json::to_vec(&WireTable { data: render(rows) })?;
    Ok(payload)
}

/// Decode a frame payload into a validated table.
pub fn deserialize(payload: &[u8]) -> Result<Table> {
    let wire: WireTable = serde_json::from_slice(payload)?;
    let table = Table::try_from(wire)?;
    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        "deserialized table"
    );
    Ok(table)
}

fn render(rows: &[Vec<f64>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().copied().map(format_cell).collect())
        .collect()
}
