// projeto: fireemissionsai
// file: src/neural/mod.rs
// Module declarations for the emissions regression network

pub mod utils;    // Activations, losses, feature scaling and the SGD optimizer
pub mod model;    // Dense/batch-norm network with forward and backward passes
pub mod metrics;  // Regression metrics and training history
pub mod storage;  // Bincode persistence of model weights
pub mod trainer;  // Mini-batch training loop and evaluation

// Re-export commonly used items for convenience
pub use model::{Architecture, ModelWeights, NeuralNetwork};
pub use metrics::{MetricsTracker, RegressionMetrics, TrainingMetrics};
pub use utils::{Activation, FeatureStats, SgdOptimizer};
pub use storage::{load_model, save_model};
pub use trainer::{Trainer, TrainingConfig, evaluate, obtain_network, retrain};
