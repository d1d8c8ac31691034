// projeto: fireemissionsai
// file: src/neural/utils.rs
// Activations, losses, input standardization and the SGD optimizer

use std::collections::HashMap;

use ndarray::{Array, Array1, Array2, Axis, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::{GfedError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    pub fn apply(self, x: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Relu => x.mapv(|v| v.max(0.0)),
            Activation::Linear => x.clone(),
        }
    }

    /// Derivative evaluated at the pre-activation values.
    pub fn derivative(self, pre_activation: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::Relu => pre_activation.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Linear => Array2::ones(pre_activation.raw_dim()),
        }
    }
}

pub fn mae_loss(predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
    (predictions - targets).mapv(f64::abs).mean().unwrap_or(0.0)
}

pub fn mse_loss(predictions: &Array2<f64>, targets: &Array2<f64>) -> f64 {
    (predictions - targets).mapv(|d| d * d).mean().unwrap_or(0.0)
}

/// Gradient of the mean absolute error with respect to the predictions.
pub fn mae_gradient(predictions: &Array2<f64>, targets: &Array2<f64>) -> Array2<f64> {
    let n = predictions.len().max(1) as f64;
    (predictions - targets).mapv(|d| {
        if d > 0.0 {
            1.0 / n
        } else if d < 0.0 {
            -1.0 / n
        } else {
            0.0
        }
    })
}

/// Per-column mean and standard deviation of the training inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureStats {
    pub means: Array1<f64>,
    pub stds: Array1<f64>,
}

impl FeatureStats {
    pub fn identity(dim: usize) -> Self {
        Self { means: Array1::zeros(dim), stds: Array1::ones(dim) }
    }

    /// Constant columns keep a unit deviation so unseen values stay finite.
    pub fn fit(data: &Array2<f64>) -> Result<Self> {
        let means = data
            .mean_axis(Axis(0))
            .ok_or_else(|| GfedError::DataProcessing("cannot standardize an empty matrix".to_string()))?;
        let stds = data
            .var_axis(Axis(0), 0.0)
            .mapv(|v| {
                let std = v.sqrt();
                if std < 1e-8 { 1.0 } else { std }
            });
        Ok(Self { means, stds })
    }

    pub fn dim(&self) -> usize {
        self.means.len()
    }

    pub fn apply(&self, data: &Array2<f64>) -> Array2<f64> {
        (data - &self.means) / &self.stds
    }
}

/// Momentum SGD with time-based decay: `lr / (1 + decay * iterations)`.
#[derive(Debug, Clone)]
pub struct SgdOptimizer {
    pub learning_rate: f64,
    pub momentum: f64,
    pub decay: f64,
    iterations: usize,
    velocity: HashMap<String, Vec<f64>>,
}

impl SgdOptimizer {
    pub fn new(learning_rate: f64, momentum: f64, decay: f64) -> Self {
        SgdOptimizer {
            learning_rate,
            momentum,
            decay,
            iterations: 0,
            velocity: HashMap::new(),
        }
    }

    pub fn current_rate(&self) -> f64 {
        self.learning_rate / (1.0 + self.decay * self.iterations as f64)
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn update<D: Dimension>(&mut self, param_name: &str, param: &mut Array<f64, D>, gradient: &Array<f64, D>) {
        let rate = self.current_rate();
        let momentum = self.momentum;
        let velocity = self
            .velocity
            .entry(param_name.to_string())
            .or_insert_with(|| vec![0.0; gradient.len()]);

        for ((p, g), v) in param.iter_mut().zip(gradient.iter()).zip(velocity.iter_mut()) {
            *v = momentum * *v - rate * g;
            *p += *v;
        }
    }

    /// Call once per mini-batch, after every parameter has been updated.
    pub fn finish_step(&mut self) {
        self.iterations += 1;
    }

    pub fn reset(&mut self) {
        self.iterations = 0;
        self.velocity.clear();
    }
}
