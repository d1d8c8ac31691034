// projeto: fireemissionsai
// file: src/neural/model.rs
// Feed-forward regression network: dense ReLU layers with optional batch normalization

use chrono::Utc;
use log::info;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::{GfedError, Result};
use crate::neural::utils::{Activation, FeatureStats, SgdOptimizer, mae_gradient, mae_loss};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenseLayerWeights {
    pub w: Array2<f64>, // (inputs, units)
    pub b: Array1<f64>, // (units)
    pub activation: Activation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchNormWeights {
    pub gamma: Array1<f64>,
    pub beta: Array1<f64>,
    pub running_mean: Array1<f64>,
    pub running_var: Array1<f64>,
    pub momentum: f64,
    pub epsilon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LayerWeights {
    Dense(DenseLayerWeights),
    BatchNorm(BatchNormWeights),
}

/// Everything needed to rebuild a trained network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelWeights {
    pub layers: Vec<LayerWeights>,
    pub feature_stats: FeatureStats,
    pub input_dim: usize,
    pub output_dim: usize,
    pub epoch: usize,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Architecture {
    pub input_dim: usize,
    pub output_dim: usize,
    pub hidden_units: usize,
    pub hidden_layers: usize,
    pub batch_norm: bool,
    pub output_activation: Activation,
}

impl Architecture {
    pub fn from_config(input_dim: usize, output_dim: usize, config: &ModelConfig) -> Self {
        Self {
            input_dim,
            output_dim,
            hidden_units: config.hidden_units,
            hidden_layers: config.hidden_layers,
            batch_norm: config.batch_norm,
            output_activation: config.output_activation,
        }
    }
}

enum LayerCache {
    Dense { input: Array2<f64>, pre_activation: Array2<f64> },
    BatchNorm { normalized: Array2<f64>, inv_std: Array1<f64> },
}

enum LayerGradient {
    Dense { dw: Array2<f64>, db: Array1<f64> },
    BatchNorm { dgamma: Array1<f64>, dbeta: Array1<f64> },
}

pub struct NeuralNetwork {
    layers: Vec<LayerWeights>,
    feature_stats: FeatureStats,
    input_dim: usize,
    output_dim: usize,
    epoch: usize,
}

fn dense_layer(rng: &mut StdRng, inputs: usize, units: usize, activation: Activation) -> Result<LayerWeights> {
    // He normal
    let normal = Normal::new(0.0, (2.0 / inputs as f64).sqrt())
        .map_err(|e| GfedError::ModelConfiguration(format!("invalid initializer: {}", e)))?;
    Ok(LayerWeights::Dense(DenseLayerWeights {
        w: Array2::from_shape_fn((inputs, units), |_| rng.sample(normal)),
        b: Array1::zeros(units),
        activation,
    }))
}

fn batch_norm_layer(units: usize) -> LayerWeights {
    LayerWeights::BatchNorm(BatchNormWeights {
        gamma: Array1::ones(units),
        beta: Array1::zeros(units),
        running_mean: Array1::zeros(units),
        running_var: Array1::ones(units),
        momentum: 0.99,
        epsilon: 1e-3,
    })
}

impl NeuralNetwork {
    pub fn new(arch: &Architecture, rng: &mut StdRng) -> Result<Self> {
        if arch.input_dim == 0 || arch.output_dim == 0 {
            return Err(GfedError::ModelConfiguration(format!(
                "network needs at least one input and one output, got {} -> {}",
                arch.input_dim, arch.output_dim
            )));
        }
        if arch.hidden_units == 0 || arch.hidden_layers == 0 {
            return Err(GfedError::ModelConfiguration(
                "network needs at least one hidden layer with one unit".to_string(),
            ));
        }

        let mut layers = Vec::with_capacity(arch.hidden_layers + 2);
        layers.push(dense_layer(rng, arch.input_dim, arch.hidden_units, Activation::Relu)?);
        if arch.batch_norm {
            layers.push(batch_norm_layer(arch.hidden_units));
        }
        for _ in 1..arch.hidden_layers {
            layers.push(dense_layer(rng, arch.hidden_units, arch.hidden_units, Activation::Relu)?);
        }
        layers.push(dense_layer(rng, arch.hidden_units, arch.output_dim, arch.output_activation)?);

        let network = NeuralNetwork {
            layers,
            feature_stats: FeatureStats::identity(arch.input_dim),
            input_dim: arch.input_dim,
            output_dim: arch.output_dim,
            epoch: 0,
        };
        info!("🛠️ Network {} -> {}x{} -> {} with {} parameters",
              arch.input_dim, arch.hidden_layers, arch.hidden_units, arch.output_dim,
              network.num_parameters());
        Ok(network)
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub(crate) fn set_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
    }

    pub fn set_feature_stats(&mut self, stats: FeatureStats) -> Result<()> {
        if stats.dim() != self.input_dim {
            return Err(GfedError::ModelConfiguration(format!(
                "feature statistics cover {} columns, network expects {}",
                stats.dim(),
                self.input_dim
            )));
        }
        self.feature_stats = stats;
        Ok(())
    }

    pub fn num_parameters(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| match layer {
                LayerWeights::Dense(d) => d.w.len() + d.b.len(),
                LayerWeights::BatchNorm(bn) => bn.gamma.len() + bn.beta.len(),
            })
            .sum()
    }

    fn check_input(&self, input: &Array2<f64>) -> Result<()> {
        if input.ncols() != self.input_dim {
            return Err(GfedError::ModelConfiguration(format!(
                "input has {} columns, model expects {}",
                input.ncols(),
                self.input_dim
            )));
        }
        Ok(())
    }

    /// Inference pass; batch normalization uses its running statistics.
    pub fn predict(&self, input: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_input(input)?;
        let mut x = self.feature_stats.apply(input);
        for layer in &self.layers {
            x = match layer {
                LayerWeights::Dense(d) => d.activation.apply(&(x.dot(&d.w) + &d.b)),
                LayerWeights::BatchNorm(bn) => {
                    let inv_std = bn.running_var.mapv(|v| 1.0 / (v + bn.epsilon).sqrt());
                    (&x - &bn.running_mean) * &inv_std * &bn.gamma + &bn.beta
                }
            };
        }
        Ok(x)
    }

    /// Training pass on one mini-batch. Updates batch-norm running statistics.
    fn forward_train(&mut self, input: &Array2<f64>) -> (Array2<f64>, Vec<LayerCache>) {
        let mut x = self.feature_stats.apply(input);
        let mut caches = Vec::with_capacity(self.layers.len());
        for layer in self.layers.iter_mut() {
            match layer {
                LayerWeights::Dense(d) => {
                    let pre_activation = x.dot(&d.w) + &d.b;
                    let output = d.activation.apply(&pre_activation);
                    caches.push(LayerCache::Dense { input: x, pre_activation });
                    x = output;
                }
                LayerWeights::BatchNorm(bn) => {
                    let n = x.nrows() as f64;
                    let mean = x.sum_axis(Axis(0)) / n;
                    let centered = &x - &mean;
                    let var = centered.mapv(|v| v * v).sum_axis(Axis(0)) / n;
                    let inv_std = var.mapv(|v| 1.0 / (v + bn.epsilon).sqrt());
                    let normalized = &centered * &inv_std;

                    bn.running_mean = &bn.running_mean * bn.momentum + &mean * (1.0 - bn.momentum);
                    bn.running_var = &bn.running_var * bn.momentum + &var * (1.0 - bn.momentum);

                    x = &normalized * &bn.gamma + &bn.beta;
                    caches.push(LayerCache::BatchNorm { normalized, inv_std });
                }
            }
        }
        (x, caches)
    }

    fn backward(&self, output_gradient: Array2<f64>, caches: &[LayerCache]) -> Vec<LayerGradient> {
        let mut grad = output_gradient;
        let mut gradients = Vec::with_capacity(self.layers.len());
        for (layer, cache) in self.layers.iter().zip(caches.iter()).rev() {
            match (layer, cache) {
                (LayerWeights::Dense(d), LayerCache::Dense { input, pre_activation }) => {
                    let dz = &grad * &d.activation.derivative(pre_activation);
                    let dw = input.t().dot(&dz);
                    let db = dz.sum_axis(Axis(0));
                    grad = dz.dot(&d.w.t());
                    gradients.push(LayerGradient::Dense { dw, db });
                }
                (LayerWeights::BatchNorm(bn), LayerCache::BatchNorm { normalized, inv_std }) => {
                    let n = grad.nrows() as f64;
                    let dgamma = (&grad * normalized).sum_axis(Axis(0));
                    let dbeta = grad.sum_axis(Axis(0));
                    let dnorm = &grad * &bn.gamma;
                    let dnorm_sum = dnorm.sum_axis(Axis(0));
                    let dnorm_dot = (&dnorm * normalized).sum_axis(Axis(0));
                    grad = (&dnorm * n - &dnorm_sum - normalized * &dnorm_dot) * inv_std / n;
                    gradients.push(LayerGradient::BatchNorm { dgamma, dbeta });
                }
                _ => unreachable!("layer cache built from the same layer list"),
            }
        }
        gradients.reverse();
        gradients
    }

    /// One optimizer step on a mini-batch; returns the batch MAE before the update.
    pub fn train_batch(
        &mut self,
        input: &Array2<f64>,
        targets: &Array2<f64>,
        optimizer: &mut SgdOptimizer,
    ) -> Result<f64> {
        self.check_input(input)?;
        if targets.dim() != (input.nrows(), self.output_dim) {
            return Err(GfedError::Training(format!(
                "targets shaped {:?}, expected ({}, {})",
                targets.dim(),
                input.nrows(),
                self.output_dim
            )));
        }
        let (predictions, caches) = self.forward_train(input);
        let loss = mae_loss(&predictions, targets);
        if !loss.is_finite() {
            return Err(GfedError::Training(format!("loss diverged to {}", loss)));
        }
        let gradients = self.backward(mae_gradient(&predictions, targets), &caches);

        for (idx, (layer, gradient)) in self.layers.iter_mut().zip(gradients.iter()).enumerate() {
            match (layer, gradient) {
                (LayerWeights::Dense(d), LayerGradient::Dense { dw, db }) => {
                    optimizer.update(&format!("dense{}.w", idx), &mut d.w, dw);
                    optimizer.update(&format!("dense{}.b", idx), &mut d.b, db);
                }
                (LayerWeights::BatchNorm(bn), LayerGradient::BatchNorm { dgamma, dbeta }) => {
                    optimizer.update(&format!("bn{}.gamma", idx), &mut bn.gamma, dgamma);
                    optimizer.update(&format!("bn{}.beta", idx), &mut bn.beta, dbeta);
                }
                _ => unreachable!("gradients built from the same layer list"),
            }
        }
        optimizer.finish_step();
        Ok(loss)
    }

    pub fn get_weights(&self) -> ModelWeights {
        ModelWeights {
            layers: self.layers.clone(),
            feature_stats: self.feature_stats.clone(),
            input_dim: self.input_dim,
            output_dim: self.output_dim,
            epoch: self.epoch,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn from_weights(weights: ModelWeights) -> Result<Self> {
        let mut width = weights.input_dim;
        for layer in &weights.layers {
            match layer {
                LayerWeights::Dense(d) => {
                    if d.w.nrows() != width || d.b.len() != d.w.ncols() {
                        return Err(GfedError::ModelConfiguration(format!(
                            "dense layer {:?} does not follow width {}",
                            d.w.dim(),
                            width
                        )));
                    }
                    width = d.w.ncols();
                }
                LayerWeights::BatchNorm(bn) => {
                    if bn.gamma.len() != width {
                        return Err(GfedError::ModelConfiguration(format!(
                            "batch normalization over {} units after width {}",
                            bn.gamma.len(),
                            width
                        )));
                    }
                }
            }
        }
        if width != weights.output_dim || weights.feature_stats.dim() != weights.input_dim {
            return Err(GfedError::ModelConfiguration(
                "stored weights disagree with their declared dimensions".to_string(),
            ));
        }
        Ok(NeuralNetwork {
            layers: weights.layers,
            feature_stats: weights.feature_stats,
            input_dim: weights.input_dim,
            output_dim: weights.output_dim,
            epoch: weights.epoch,
        })
    }
}
