// projeto: fireemissionsai
// file: src/gfed/mod.rs
// GFED HDF5 layout, validation and grid iteration

pub mod layout;    // Group names, fields and accepted extensions
pub mod validator; // Structural checks with per-group diagnostics
pub mod source;    // GridSource trait with HDF5 and in-memory backends
pub mod cursor;    // Immutable (file, month, i, j) cursor
pub mod parser;    // GfedDataParser: entries, targets and neighbourhoods

#[cfg(test)]
pub(crate) mod fixtures;

pub use cursor::{Cursor, GridBounds};
pub use layout::Field;
pub use parser::{Entry, Example, FieldValues, GfedDataParser};
pub use source::{GridSource, Hdf5Source, MemorySource, MemoryYear, MonthFrame, StaticLayers};
pub use validator::{ValidationReport, Validator};
