use image::RgbImage;
use shared::{BatchResponse, HealthResponse, HistoryResponse, InferenceResponse};

use crate::config::AppConfig;
use crate::error::ConfigurationError;
use crate::history::History;
use crate::inference::{decode_rgb, select_adapter, InferenceAdapter};
use crate::pipeline::{self, DiagnosisPipeline, PipelineOutcome};
use crate::report;

/// One serving session: the pipeline plus the history it records into.
/// Callers serialise access; nothing in here locks.
pub struct DiagnosisService {
    pipeline: DiagnosisPipeline,
    history: History,
}

impl DiagnosisService {
    pub fn new(pipeline: DiagnosisPipeline, history: History) -> Self {
        Self { pipeline, history }
    }

    /// Builds the configured adapter and validates it against the label set.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigurationError> {
        let (labels, _) = config.validate()?;
        let adapter = select_adapter(&config.inference, &labels)?;
        Self::with_adapter(config, adapter)
    }

    pub fn with_adapter(
        config: &AppConfig,
        adapter: Box<dyn InferenceAdapter>,
    ) -> Result<Self, ConfigurationError> {
        let mut pipeline = DiagnosisPipeline::from_config(config, adapter)?;
        pipeline.validate()?;
        Ok(Self::new(
            pipeline,
            History::new(config.history.display_limit),
        ))
    }

    pub fn pipeline(&self) -> &DiagnosisPipeline {
        &self.pipeline
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn diagnose_image(
        &mut self,
        image: &RgbImage,
    ) -> Result<InferenceResponse, ConfigurationError> {
        let outcome = self.pipeline.run(image, &mut self.history)?;
        self.to_response(&outcome)
    }

    pub fn diagnose_bytes(&mut self, bytes: &[u8]) -> Result<InferenceResponse, ConfigurationError> {
        match decode_rgb(bytes) {
            Ok(image) => self.diagnose_image(&image),
            Err(e) => {
                log::warn!("Rejected upload: {}", e);
                self.to_response(&PipelineOutcome::error(e))
            }
        }
    }

    pub fn diagnose_batch(
        &mut self,
        payloads: &[Vec<u8>],
    ) -> Result<BatchResponse, ConfigurationError> {
        let batch = pipeline::run_encoded_batch(&mut self.pipeline, payloads, &mut self.history)?;
        let results = batch
            .outcomes
            .iter()
            .map(|outcome| self.to_response(outcome))
            .collect::<Result<Vec<_>, _>>()?;
        let report = report::render_batch(&batch, self.pipeline.labels(), self.pipeline.diseases())?;
        Ok(BatchResponse {
            no_images_supplied: batch.no_images_supplied(),
            results,
            report,
        })
    }

    pub fn history_view(&self) -> HistoryResponse {
        let recent = self.history.recent();
        HistoryResponse {
            total_recorded: self.history.len(),
            entries: recent.iter().map(|entry| entry.to_dto()).collect(),
            report: report::render_history(recent, self.pipeline.diseases()),
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            service: "cassava-leaf-diagnosis".to_string(),
            adapter: self.pipeline.adapter_name().to_string(),
            class_labels: self.pipeline.labels().to_vec(),
        }
    }

    fn to_response(&self, outcome: &PipelineOutcome) -> Result<InferenceResponse, ConfigurationError> {
        let labels = self.pipeline.labels();
        let diseases = self.pipeline.diseases();
        let report = report::render_outcome(outcome, labels, diseases)?;

        let mut response = InferenceResponse {
            status: outcome.status(),
            reason: None,
            category: None,
            prediction: None,
            disease: None,
            error: None,
            predictions: Vec::new(),
            class_labels: labels.to_vec(),
            report,
        };
        match outcome {
            PipelineOutcome::Rejected { reason, category } => {
                response.reason = Some(reason.clone());
                response.category = Some(*category);
            }
            PipelineOutcome::LowConfidence { prediction } => {
                response.prediction = Some(prediction.to_dto());
                response.predictions = prediction.scores.clone();
            }
            PipelineOutcome::Accepted { prediction } => {
                response.prediction = Some(prediction.to_dto());
                response.predictions = prediction.scores.clone();
                response.disease = Some(diseases.lookup(&prediction.label)?.to_dto());
            }
            PipelineOutcome::Error { message } => {
                response.error = Some(message.clone());
            }
        }
        Ok(response)
    }
}
