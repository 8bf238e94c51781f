use std::path::Path;

use super::{InferenceAdapter, InferenceError, ModelPrecision, RandomFallback};
use crate::config::{InferenceConfig, StrategyKind};
use crate::disease::LabelSet;
use crate::error::ConfigurationError;

/// Walks the configured preference list once and returns the first strategy
/// that initialises.
pub fn select_adapter(
    config: &InferenceConfig,
    labels: &LabelSet,
) -> Result<Box<dyn InferenceAdapter>, ConfigurationError> {
    for kind in &config.strategies {
        match build_strategy(*kind, config, labels) {
            Ok(adapter) => {
                log::info!("Using {} inference strategy", adapter.name());
                return Ok(adapter);
            }
            Err(e) => log::warn!("Skipping {:?} inference strategy: {}", kind, e),
        }
    }
    Err(ConfigurationError::NoInferenceStrategy)
}

fn build_strategy(
    kind: StrategyKind,
    config: &InferenceConfig,
    labels: &LabelSet,
) -> Result<Box<dyn InferenceAdapter>, InferenceError> {
    match kind {
        StrategyKind::Quantized => load_torchscript(
            &config.quantized_model_path,
            ModelPrecision::Quantized,
            config.apply_softmax,
        ),
        StrategyKind::FullPrecision => load_torchscript(
            &config.full_model_path,
            ModelPrecision::Full,
            config.apply_softmax,
        ),
        StrategyKind::Random => {
            log::warn!("Serving random predictions; no trained model is in use");
            Ok(Box::new(RandomFallback::new(labels.len(), config.seed)))
        }
    }
}

#[cfg(feature = "torch")]
fn load_torchscript(
    path: &Path,
    precision: ModelPrecision,
    apply_softmax: bool,
) -> Result<Box<dyn InferenceAdapter>, InferenceError> {
    let runner = super::torch::TorchScriptRunner::load(path, precision, apply_softmax)?;
    Ok(Box::new(runner))
}

#[cfg(not(feature = "torch"))]
fn load_torchscript(
    path: &Path,
    _precision: ModelPrecision,
    _apply_softmax: bool,
) -> Result<Box<dyn InferenceAdapter>, InferenceError> {
    Err(InferenceError::Unavailable(format!(
        "built without the `torch` feature, cannot load {}",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disease;

    fn labels() -> LabelSet {
        LabelSet::new(disease::default_labels()).unwrap()
    }

    #[test]
    fn falls_through_to_random_when_models_are_missing() {
        let config = InferenceConfig {
            quantized_model_path: "does/not/exist.pt".into(),
            full_model_path: "does/not/exist_either.pt".into(),
            ..InferenceConfig::default()
        };
        let adapter = select_adapter(&config, &labels()).unwrap();
        assert_eq!(adapter.name(), "random-fallback");
        assert_eq!(adapter.output_len(), Some(5));
    }

    #[test]
    fn no_usable_strategy_is_a_configuration_error() {
        let config = InferenceConfig {
            strategies: vec![StrategyKind::Quantized],
            quantized_model_path: "does/not/exist.pt".into(),
            ..InferenceConfig::default()
        };
        assert_eq!(
            select_adapter(&config, &labels()).err(),
            Some(ConfigurationError::NoInferenceStrategy)
        );
    }
}
