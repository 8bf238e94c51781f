use super::outcome::{PipelineOutcome, Prediction};
use crate::config::GateConfig;
use crate::disease::LabelSet;
use crate::error::ConfigurationError;
use crate::inference::ProbabilityVector;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    threshold_percent: f64,
    strict: bool,
    tolerance: f64,
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self::from(&GateConfig::default())
    }
}

impl From<&GateConfig> for ConfidenceGate {
    fn from(config: &GateConfig) -> Self {
        Self::new(config.threshold_percent, config.strict, config.tolerance)
    }
}

impl ConfidenceGate {
    pub fn new(threshold_percent: f64, strict: bool, tolerance: f64) -> Self {
        Self {
            threshold_percent,
            strict,
            tolerance,
        }
    }

    pub fn threshold_percent(&self) -> f64 {
        self.threshold_percent
    }

    /// Picks the best label and compares its percentage with the threshold
    /// (inclusive). Shape violations are configuration errors.
    pub fn gate(
        &self,
        probabilities: &ProbabilityVector,
        labels: &LabelSet,
    ) -> Result<PipelineOutcome, ConfigurationError> {
        self.validate(probabilities, labels)?;

        let (index, probability) =
            probabilities
                .argmax()
                .ok_or(ConfigurationError::InvalidProbability {
                    index: 0,
                    value: f64::NAN,
                })?;
        let label = labels
            .get(index)
            .ok_or(ConfigurationError::LengthMismatch {
                expected: labels.len(),
                actual: probabilities.len(),
            })?
            .to_string();

        let confidence = probability * 100.0;
        let prediction = Prediction {
            label,
            index,
            probability,
            confidence,
            scores: probabilities.values().to_vec(),
        };

        if confidence < self.threshold_percent {
            log::info!(
                "Low confidence for {}: {:.1}% < {:.1}%",
                prediction.label,
                confidence,
                self.threshold_percent
            );
            Ok(PipelineOutcome::LowConfidence { prediction })
        } else {
            Ok(PipelineOutcome::Accepted { prediction })
        }
    }

    pub fn validate(
        &self,
        probabilities: &ProbabilityVector,
        labels: &LabelSet,
    ) -> Result<(), ConfigurationError> {
        if probabilities.is_empty() {
            return Err(ConfigurationError::EmptyProbabilities);
        }
        if probabilities.len() != labels.len() {
            return Err(ConfigurationError::LengthMismatch {
                expected: labels.len(),
                actual: probabilities.len(),
            });
        }
        if !self.strict {
            return Ok(());
        }

        if let Some((index, &value)) = probabilities
            .values()
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(ConfigurationError::InvalidProbability { index, value });
        }
        let sum = probabilities.sum();
        if (sum - 1.0).abs() > self.tolerance {
            return Err(ConfigurationError::NotNormalized {
                sum,
                tolerance: self.tolerance,
            });
        }
        Ok(())
    }
}
