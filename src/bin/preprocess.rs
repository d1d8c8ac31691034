// projeto: fireemissionsai
// file: src/bin/preprocess.rs
// Validates a directory of GFED4.1s files and writes train/validation/test CSVs

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use log::{debug, error, info};

use fireemissionsai::config::Settings;
use fireemissionsai::dataset::{CsvSink, SplitPolicy, StreamOptions, discover_valid_files, stream_examples};
use fireemissionsai::error::Result;
use fireemissionsai::gfed::{GfedDataParser, Hdf5Source};

#[derive(Parser, Debug)]
#[command(
    name = "preprocess",
    version,
    about = "Turns GFED4.1s HDF5 files into CSV feature/target tables",
    long_about = "Checks every file in DIRECTORY against the GFED4.1s layout, then walks the valid files \
                  cell by cell and month by month, writing burning land cells paired with next month's \
                  values into train, validation and test CSV files."
)]
struct Cli {
    /// Directory containing the GFED .hdf5 files
    directory: PathBuf,

    /// Maximum number of examples to write
    #[arg(long)]
    size: Option<usize>,

    /// Append the 5x5 neighbourhood of every field to each feature row
    #[arg(long)]
    neighbourhood: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return Ok(());
        }
    };

    setup_logging(cli.verbose);
    let start_time = Instant::now();

    match run(&cli) {
        Ok(()) => {
            info!("✅ Preprocessing finished in {:.2}s", start_time.elapsed().as_secs_f64());
        }
        Err(e) => {
            error!("❌ Preprocessing failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let options = StreamOptions {
        size: cli.size.unwrap_or(settings.preprocess.size),
        neighbourhood: cli.neighbourhood || settings.preprocess.neighbourhood,
        policy: SplitPolicy::new(settings.preprocess.train_percent, settings.preprocess.test_percent),
    };
    debug!("Stream options: {:?}", options);

    println!("Processing files in directory '{}'.", cli.directory.display());
    println!("The following files adhered to the correct format.");
    let files = discover_valid_files(&cli.directory)?;
    if files.is_empty() {
        return Ok(());
    }

    process(files, &options, &settings.paths.output_dir)
}

fn process(files: Vec<PathBuf>, options: &StreamOptions, output_dir: &Path) -> Result<()> {
    info!("🔥 Streaming up to {} examples from {} files", options.size, files.len());
    let source = Hdf5Source::new(files)?;
    let mut parser = GfedDataParser::new(source, options.neighbourhood)?;
    let bounds = parser.bounds();
    info!("🗺️ Grid {}x{} over {} files ({} states), {} feature columns",
          bounds.rows, bounds.cols, bounds.files, bounds.states(), parser.feature_width());

    let mut sink = CsvSink::create(output_dir)?;
    let summary = stream_examples(&mut parser, options, &mut sink)?;
    summary.print();
    Ok(())
}
