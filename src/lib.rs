// projeto: fireemissionsai
// file: src/lib.rs
// GFED4.1s HDF5 preprocessing and emissions prediction

pub mod config;  // TOML settings
pub mod error;   // Crate-wide error type
pub mod gfed;    // HDF5 layout, validation and the grid parser
pub mod dataset; // Filtering, splitting and CSV output
pub mod neural;  // Feed-forward regression network

pub use config::Settings;
pub use error::{GfedError, Result};
