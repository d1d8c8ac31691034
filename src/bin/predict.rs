// projeto: fireemissionsai
// file: src/bin/predict.rs
// Predicts next-month GFED values for a CSV of feature rows, optionally retraining first

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::{debug, error, info};

use fireemissionsai::config::Settings;
use fireemissionsai::dataset::{read_matrix, write_matrix};
use fireemissionsai::error::{GfedError, Result};
use fireemissionsai::neural::obtain_network;

#[derive(Parser, Debug)]
#[command(
    name = "predict",
    version,
    about = "Predicts next-month burned fraction and emissions from preprocessed feature rows"
)]
struct Cli {
    /// Headerless CSV of feature rows
    inputs: PathBuf,

    /// Train a new model on the preprocessed train/validation/test CSVs
    #[arg(long)]
    retrain: bool,

    /// Save the retrained model and its training history
    #[arg(long)]
    persist: bool,

    /// Debug logging
    #[arg(long)]
    debug: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return Ok(());
        }
    };

    setup_logging(cli.debug);
    let start_time = Instant::now();

    match run(&cli) {
        Ok(()) => {
            info!("✅ Done in {:.2}s", start_time.elapsed().as_secs_f64());
        }
        Err(e) => {
            error!("❌ Prediction failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn setup_logging(debug: bool) {
    let level = if debug {
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
    let network = obtain_network(&settings, cli.retrain, cli.persist)?;

    let inputs = read_matrix(&cli.inputs)?;
    if inputs.ncols() != network.input_dim() {
        return Err(GfedError::ModelConfiguration(format!(
            "{} has {} columns but the model expects {}",
            cli.inputs.display(),
            inputs.ncols(),
            network.input_dim()
        )));
    }
    let predictions = network.predict(&inputs)?;
    write_matrix(&settings.paths.output_dir.join("predictions.csv"), &predictions)?;
    debug!("{} rows predicted", predictions.nrows());
    println!("Predictions saved to output directory.");
    Ok(())
}
