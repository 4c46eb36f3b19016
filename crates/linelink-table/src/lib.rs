//! Lossless wire format for rectangular `f64` tables.
//!
//! A [`Table`] is rendered cell by cell in shortest round-trip exponential
//! notation and carried as `{"data": [[...], ...]}` inside a single line.
//! Shape is checked on both the encode and decode paths.

pub mod error;
pub mod table;
pub mod wire;

pub use error::{Result, TableError};
pub use table::Table;
pub use wire::{deserialize, serialize, serialize_rows, WireTable};
