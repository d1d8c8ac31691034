// projeto: fireemissionsai
// file: src/dataset/mod.rs
// Turning parser states into train/validation/test CSV tables

pub mod filter;   // Ocean and burned-area admission rules
pub mod split;    // Modulo-count bucketing
pub mod csv_io;   // CSV sink and matrix readers/writers
pub mod pipeline; // Directory discovery and example streaming

pub use csv_io::{CsvSink, ExampleSink, read_matrix, read_split, write_matrix};
pub use filter::{ExampleFilter, Verdict};
pub use pipeline::{StreamOptions, StreamSummary, discover_valid_files, stream_examples};
pub use split::{Split, SplitPolicy};
