// projeto: fireemissionsai
// file: src/neural/storage.rs
// Model weights persisted as a bincode file

use std::fs;
use std::path::Path;

use log::info;

use crate::error::Result;
use crate::neural::model::ModelWeights;

pub fn save_model(path: &Path, weights: &ModelWeights) -> Result<()> {
    let bytes = bincode::serde::encode_to_vec(weights, bincode::config::standard())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &bytes)?;
    info!("💾 Model saved to {} ({} bytes, epoch {})", path.display(), bytes.len(), weights.epoch);
    Ok(())
}

pub fn load_model(path: &Path) -> Result<ModelWeights> {
    let bytes = fs::read(path)?;
    let (weights, _): (ModelWeights, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
    info!("📂 Model loaded from {} (trained {}, epoch {})", path.display(), weights.timestamp, weights.epoch);
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GfedError;
    use crate::neural::model::{Architecture, NeuralNetwork};
    use crate::neural::utils::Activation;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("model_weights.bin");
        let arch = Architecture {
            input_dim: 4,
            output_dim: 2,
            hidden_units: 6,
            hidden_layers: 2,
            batch_norm: true,
            output_activation: Activation::Relu,
        };
        let network = NeuralNetwork::new(&arch, &mut StdRng::seed_from_u64(9)).unwrap();
        let weights = network.get_weights();
        save_model(&path, &weights).unwrap();

        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded, weights);

        let input = array![[1.0, 0.0, -1.0, 2.0]];
        let restored = NeuralNetwork::from_weights(loaded).unwrap();
        assert_eq!(restored.predict(&input).unwrap(), network.predict(&input).unwrap());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_weights.bin");
        fs::write(&path, b"\x01\x02").unwrap();
        assert!(matches!(load_model(&path), Err(GfedError::Serialization(_))));
        assert!(matches!(load_model(&dir.path().join("missing.bin")), Err(GfedError::Io(_))));
    }
}
