// projeto: fireemissionsai
// file: src/dataset/pipeline.rs
// Validates a directory of GFED files and streams admitted examples into a sink

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::dataset::csv_io::ExampleSink;
use crate::dataset::filter::{ExampleFilter, Verdict};
use crate::dataset::split::{Split, SplitPolicy};
use crate::error::Result;
use crate::gfed::parser::GfedDataParser;
use crate::gfed::source::{GridSource, list_files};
use crate::gfed::validator::Validator;

#[derive(Debug, Clone, Copy)]
pub struct StreamOptions {
    /// Stop after this many admitted examples.
    pub size: usize,
    pub neighbourhood: bool,
    pub policy: SplitPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub visited: usize,
    pub ocean: usize,
    pub no_target: usize,
    pub unburned: usize,
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

impl StreamSummary {
    pub fn admitted(&self) -> usize {
        self.train + self.validation + self.test
    }

    fn record(&mut self, split: Split) {
        match split {
            Split::Train => self.train += 1,
            Split::Validation => self.validation += 1,
            Split::Test => self.test += 1,
        }
    }

    pub fn print(&self) {
        println!("📊 Examples written: {}", self.admitted());
        println!("   ├── Train: {}", self.train);
        println!("   ├── Validation: {}", self.validation);
        println!("   └── Test: {}", self.test);
        println!("   States visited: {} (ocean {}, no target {}, unburned {})",
                 self.visited, self.ocean, self.no_target, self.unburned);
    }
}

/// Sorted files in `dir` that pass both validator checks. Prints the name of
/// every valid file and a notice when there are none.
pub fn discover_valid_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut valid = Vec::new();
    for path in list_files(dir)? {
        if Validator::valid_hdf_file(&path) && Validator::valid_hdf_structure(&path) {
            if let Some(name) = path.file_name() {
                println!("  {}", name.to_string_lossy());
            }
            valid.push(path);
        } else {
            debug!("Skipping {}", path.display());
        }
    }
    println!("...");
    if valid.is_empty() {
        println!("No valid HDF files found in that directory.");
    }
    Ok(valid)
}

/// Drives the parser from its current cursor until `options.size` examples
/// are admitted or every state has been visited.
pub fn stream_examples<S, K>(
    parser: &mut GfedDataParser<S>,
    options: &StreamOptions,
    sink: &mut K,
) -> Result<StreamSummary>
where
    S: GridSource,
    K: ExampleSink,
{
    let mut filter = ExampleFilter::new();
    let mut summary = StreamSummary::default();

    while summary.admitted() < options.size {
        summary.visited += 1;
        let entry = parser.get_entry(options.neighbourhood)?;
        let target = if entry.is_ocean() { None } else { parser.get_target()? };

        match filter.judge(&entry, target.as_ref()) {
            Verdict::Admit => {
                if let Some(target) = target {
                    let split = options.policy.assign(summary.admitted());
                    sink.accept(split, &entry.features(), &target.to_row())?;
                    summary.record(split);
                }
            }
            Verdict::Ocean => summary.ocean += 1,
            Verdict::NoTarget => summary.no_target += 1,
            Verdict::Unburned => summary.unburned += 1,
        }

        if !parser.has_next() {
            break;
        }
        parser.increment()?;
    }

    sink.finish()?;
    info!("✅ {} examples admitted from {} states", summary.admitted(), summary.visited);
    Ok(summary)
}
