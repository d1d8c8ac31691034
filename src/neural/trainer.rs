// projeto: fireemissionsai
// file: src/neural/trainer.rs
// Mini-batch training loop, evaluation and prediction helpers

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use log::{debug, info, warn};
use ndarray::{Array2, Axis, s};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::{ModelConfig, Settings};
use crate::dataset::csv_io::{read_split, write_matrix};
use crate::dataset::split::Split;
use crate::error::{GfedError, Result};
use crate::neural::metrics::{MetricsTracker, RegressionMetrics, TrainingMetrics, calculate_regression_metrics};
use crate::neural::model::{Architecture, NeuralNetwork};
use crate::neural::storage::{load_model, save_model};
use crate::neural::utils::{FeatureStats, SgdOptimizer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    pub decay: f64,
    pub seed: u64,
}

impl From<&ModelConfig> for TrainingConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            epochs: config.epochs,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            momentum: config.momentum,
            decay: config.decay,
            seed: config.seed,
        }
    }
}

pub struct Trainer {
    config: TrainingConfig,
    rng: StdRng,
    optimizer: SgdOptimizer,
}

fn check_pair(x: &Array2<f64>, y: &Array2<f64>, what: &str) -> Result<()> {
    if x.nrows() == 0 {
        return Err(GfedError::Training(format!("{} set is empty", what)));
    }
    if x.nrows() != y.nrows() {
        return Err(GfedError::Training(format!(
            "{} set has {} feature rows but {} target rows",
            what,
            x.nrows(),
            y.nrows()
        )));
    }
    Ok(())
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            optimizer: SgdOptimizer::new(config.learning_rate, config.momentum, config.decay),
            config,
        }
    }

    /// Builds a network from the trainer's seeded generator.
    pub fn build_network(&mut self, arch: &Architecture) -> Result<NeuralNetwork> {
        NeuralNetwork::new(arch, &mut self.rng)
    }

    /// Fits `network` on the training set. Input statistics are taken from
    /// `train_x` and stored in the network before the first epoch.
    pub fn fit(
        &mut self,
        network: &mut NeuralNetwork,
        train_x: &Array2<f64>,
        train_y: &Array2<f64>,
        validation: Option<(&Array2<f64>, &Array2<f64>)>,
    ) -> Result<MetricsTracker> {
        check_pair(train_x, train_y, "training")?;
        if let Some((val_x, val_y)) = validation {
            check_pair(val_x, val_y, "validation")?;
        }
        network.set_feature_stats(FeatureStats::fit(train_x)?)?;

        let mut tracker = MetricsTracker::new();
        let mut indices: Vec<usize> = (0..train_x.nrows()).collect();
        let first_epoch = network.epoch();
        info!("🎓 Training on {} examples for {} epochs (batch {})",
              train_x.nrows(), self.config.epochs, self.config.batch_size);

        for epoch in 1..=self.config.epochs {
            let started = Instant::now();
            indices.shuffle(&mut self.rng);

            let mut weighted_loss = 0.0;
            for batch in indices.chunks(self.config.batch_size) {
                let x = train_x.select(Axis(0), batch);
                let y = train_y.select(Axis(0), batch);
                let loss = network.train_batch(&x, &y, &mut self.optimizer)?;
                weighted_loss += loss * batch.len() as f64;
            }
            let train_loss = weighted_loss / indices.len() as f64;
            network.set_epoch(first_epoch + epoch);

            let val_metrics = match validation {
                Some((val_x, val_y)) => Some(evaluate(network, val_x, val_y)?),
                None => None,
            };
            info!("Epoch {}/{} - loss: {:.6}{} - {:.2}s",
                  epoch, self.config.epochs, train_loss,
                  val_metrics.map(|m| format!(" - val_loss: {:.6}", m.mae)).unwrap_or_default(),
                  started.elapsed().as_secs_f64());

            let improved = tracker.add_metrics(TrainingMetrics {
                epoch: first_epoch + epoch,
                train_loss,
                val_loss: val_metrics.map(|m| m.mae),
                val_rmse: val_metrics.map(|m| m.rmse),
                learning_rate: self.optimizer.current_rate(),
                timestamp: Utc::now().to_rfc3339(),
            });
            if improved {
                debug!("New best validation loss at epoch {}", first_epoch + epoch);
            }
        }
        Ok(tracker)
    }
}

/// Loss (MAE) and companion metrics of `network` on a labelled set.
pub fn evaluate(network: &NeuralNetwork, x: &Array2<f64>, y: &Array2<f64>) -> Result<RegressionMetrics> {
    check_pair(x, y, "evaluation")?;
    let predictions = network.predict(x)?;
    if predictions.dim() != y.dim() {
        return Err(GfedError::ModelConfiguration(format!(
            "targets shaped {:?} but model predicts {:?}",
            y.dim(),
            predictions.dim()
        )));
    }
    Ok(calculate_regression_metrics(&predictions, y))
}

pub const TEST_PREDICTIONS_FILE: &str = "test-predictions.csv";
pub const HISTORY_FILE: &str = "training-history.csv";

/// Trains a network on the CSV splits in `dir`, sized from their column
/// counts. The test split, when present, is evaluated and its predictions
/// written to `test-predictions.csv`. With `persist` the model file and
/// `training-history.csv` are saved; otherwise nothing besides the test
/// predictions touches disk.
pub fn retrain(settings: &Settings, dir: &Path, persist: bool) -> Result<NeuralNetwork> {
    let (train_x, train_y) = read_split(dir, Split::Train)?
        .ok_or_else(|| GfedError::Training(format!("no training rows in {}", dir.display())))?;
    let validation = read_split(dir, Split::Validation)?;
    let test = read_split(dir, Split::Test)?;

    let arch = Architecture::from_config(train_x.ncols(), train_y.ncols(), &settings.model);
    let mut trainer = Trainer::new(TrainingConfig::from(&settings.model));
    let mut network = trainer.build_network(&arch)?;

    let tracker = trainer.fit(&mut network, &train_x, &train_y, validation.as_ref().map(|(x, y)| (x, y)))?;
    tracker.print_summary();

    if let Some((test_x, test_y)) = &test {
        let metrics = evaluate(&network, test_x, test_y)?;
        metrics.print("Test");
        let predictions = network.predict(test_x)?;
        println!("Predictions:\n{}", predictions);
        print_expected(test_y);
        write_matrix(&dir.join(TEST_PREDICTIONS_FILE), &predictions)?;
    }

    if persist {
        save_model(&settings.paths.model_file, &network.get_weights())?;
        tracker.save_to_csv(&dir.join(HISTORY_FILE))?;
    }
    Ok(network)
}

/// The network `predict` works with: retrained from the splits in the
/// output directory, or loaded from the model file.
pub fn obtain_network(settings: &Settings, retrain_first: bool, persist: bool) -> Result<NeuralNetwork> {
    if retrain_first {
        return retrain(settings, &settings.paths.output_dir, persist);
    }
    if persist {
        warn!("--persist has no effect without --retrain");
    }
    NeuralNetwork::from_weights(load_model(&settings.paths.model_file)?)
}

fn print_expected(targets: &Array2<f64>) {
    let rows = targets.nrows();
    println!("Expected (first rows):\n{}", targets.slice(s![..rows.min(3), ..]));
    println!("Expected (last rows):\n{}", targets.slice(s![rows.saturating_sub(3).., ..]));
}
