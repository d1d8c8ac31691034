// projeto: fireemissionsai
// file: src/config.rs
// Optional TOML settings shared by the preprocess and predict binaries

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{GfedError, Result};
use crate::neural::utils::Activation;

pub const DEFAULT_CONFIG_FILE: &str = "fireemissions.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub paths: PathsConfig,
    pub preprocess: PreprocessConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub output_dir: PathBuf,
    pub model_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Maximum number of admitted examples written per run
    pub size: usize,
    /// Append the 5x5 neighbourhood of every field to each feature row
    pub neighbourhood: bool,
    pub train_percent: u32,
    pub test_percent: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub hidden_units: usize,
    pub hidden_layers: usize,
    pub batch_norm: bool,
    pub output_activation: Activation,
    pub learning_rate: f64,
    pub momentum: f64,
    pub decay: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            model_file: PathBuf::from("model_weights.bin"),
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            size: 100_000,
            neighbourhood: false,
            train_percent: 90,
            test_percent: 4,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_units: 412,
            hidden_layers: 3,
            batch_norm: true,
            output_activation: Activation::Relu,
            learning_rate: 0.02,
            momentum: 0.8,
            decay: 1e-6,
            epochs: 20,
            batch_size: 32,
            seed: 42,
        }
    }
}

impl Settings {
    /// Loads `path` if given, otherwise `fireemissions.toml` when present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let settings = Self::from_toml(&content)?;
            info!("⚙️ Configuration loaded from {}", config_path.display());
            Ok(settings)
        } else if explicit {
            Err(GfedError::InvalidFile {
                path: config_path,
                reason: "configuration file not found".to_string(),
            })
        } else {
            debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        if model.hidden_units == 0 || model.hidden_layers == 0 {
            return Err(GfedError::ModelConfiguration(
                "hidden_units and hidden_layers must be greater than zero".to_string(),
            ));
        }
        if model.epochs == 0 || model.batch_size == 0 {
            return Err(GfedError::ModelConfiguration(
                "epochs and batch_size must be greater than zero".to_string(),
            ));
        }
        if model.learning_rate <= 0.0 {
            return Err(GfedError::ModelConfiguration(format!(
                "learning_rate must be positive, got {}",
                model.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&model.momentum) {
            return Err(GfedError::ModelConfiguration(format!(
                "momentum must be in [0, 1), got {}",
                model.momentum
            )));
        }
        if model.decay < 0.0 {
            return Err(GfedError::ModelConfiguration("decay cannot be negative".to_string()));
        }
        let split = &self.preprocess;
        if split.train_percent + split.test_percent > 100 {
            return Err(GfedError::DataProcessing(format!(
                "train_percent ({}) and test_percent ({}) exceed 100",
                split.train_percent, split.test_percent
            )));
        }
        Ok(())
    }
}
