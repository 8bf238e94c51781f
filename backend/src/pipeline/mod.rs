//! Admissibility filter -> inference adapter -> confidence gate -> recorder.

pub mod batch;
pub mod gate;
pub mod outcome;

pub use batch::{run_batch, run_encoded_batch, BatchReport, BatchStatus};
pub use gate::ConfidenceGate;
pub use outcome::{PipelineOutcome, Prediction};

use image::{Rgb, RgbImage};

use crate::admission::AdmissibilityFilter;
use crate::config::AppConfig;
use crate::disease::{DiseaseTable, LabelSet};
use crate::error::ConfigurationError;
use crate::history::{History, ResultRecorder};
use crate::inference::{InferenceAdapter, InferenceError, NormalizedImage, ProbabilityVector};

pub struct DiagnosisPipeline {
    filter: AdmissibilityFilter,
    adapter: Box<dyn InferenceAdapter>,
    gate: ConfidenceGate,
    recorder: ResultRecorder,
    labels: LabelSet,
    diseases: DiseaseTable,
    input_size: u32,
}

impl DiagnosisPipeline {
    pub fn from_config(
        config: &AppConfig,
        adapter: Box<dyn InferenceAdapter>,
    ) -> Result<Self, ConfigurationError> {
        let (labels, diseases) = config.validate()?;
        Ok(Self {
            filter: AdmissibilityFilter::from_config(&config.admission),
            adapter,
            gate: ConfidenceGate::from(&config.gate),
            recorder: ResultRecorder::from(&config.history),
            labels,
            diseases,
            input_size: config.inference.input_size,
        })
    }

    pub fn with_filter(mut self, filter: AdmissibilityFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn diseases(&self) -> &DiseaseTable {
        &self.diseases
    }

    pub fn adapter_name(&self) -> &str {
        self.adapter.name()
    }

    /// Startup check that the adapter's output matches the label set. Runs a
    /// blank image through the model when the length is not known up front.
    pub fn validate(&mut self) -> Result<(), ConfigurationError> {
        let actual = match self.adapter.output_len() {
            Some(len) => len,
            None => {
                let blank = RgbImage::from_pixel(self.input_size, self.input_size, Rgb([0, 0, 0]));
                self.infer(&blank)
                    .map_err(|e| ConfigurationError::ProbeFailed(e.to_string()))?
                    .len()
            }
        };
        if actual != self.labels.len() {
            return Err(ConfigurationError::LengthMismatch {
                expected: self.labels.len(),
                actual,
            });
        }
        log::info!(
            "Adapter {} produces {} scores per image",
            self.adapter.name(),
            actual
        );
        Ok(())
    }

    /// Scores that are not finite or are negative are a fault of this one
    /// call, not of the deployment.
    fn infer(&mut self, image: &RgbImage) -> Result<ProbabilityVector, InferenceError> {
        let input = NormalizedImage::from_rgb(image, self.input_size)?;
        let probabilities = self.adapter.infer(&input)?;
        if let Some((index, &value)) = probabilities
            .values()
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(InferenceError::InvalidOutput { index, value });
        }
        Ok(probabilities)
    }

    /// Runs one image through every stage. Only configuration errors escape;
    /// everything else becomes an outcome.
    pub fn run(
        &mut self,
        image: &RgbImage,
        history: &mut History,
    ) -> Result<PipelineOutcome, ConfigurationError> {
        let admission = self.filter.check(image);
        if let (false, Some(category)) = (admission.admissible, admission.category) {
            return Ok(PipelineOutcome::Rejected {
                reason: admission.reason,
                category,
            });
        }

        let probabilities = match self.infer(image) {
            Ok(probabilities) => probabilities,
            Err(e) => {
                log::error!("Inference failed: {}", e);
                return Ok(PipelineOutcome::error(e));
            }
        };

        let outcome = self.gate.gate(&probabilities, &self.labels)?;
        if let PipelineOutcome::Accepted { prediction } = &outcome {
            self.diseases.lookup(&prediction.label)?;
            if let Err(e) = self.recorder.record(image, prediction, history) {
                log::error!("Failed to record {}: {}", prediction.label, e);
                return Ok(PipelineOutcome::error(e));
            }
        }
        Ok(outcome)
    }
}
