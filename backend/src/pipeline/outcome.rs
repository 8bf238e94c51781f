use shared::{OutcomeStatus, PredictionDto, RejectionCategory};

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub index: usize,
    /// Raw score of the chosen label, in `[0, 1]`.
    pub probability: f64,
    /// `probability * 100`.
    pub confidence: f64,
    /// The full vector the label was chosen from, in label-set order.
    pub scores: Vec<f64>,
}

impl Prediction {
    pub fn to_dto(&self) -> PredictionDto {
        PredictionDto {
            label: self.label.clone(),
            probability: self.probability,
            confidence: self.confidence,
        }
    }
}

/// Result of one image's trip through the pipeline. Exactly one per image.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Rejected {
        reason: String,
        category: RejectionCategory,
    },
    LowConfidence {
        prediction: Prediction,
    },
    Accepted {
        prediction: Prediction,
    },
    Error {
        message: String,
    },
}

impl PipelineOutcome {
    pub fn error(err: impl std::fmt::Display) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        match self {
            Self::Rejected { .. } => OutcomeStatus::Rejected,
            Self::LowConfidence { .. } => OutcomeStatus::LowConfidence,
            Self::Accepted { .. } => OutcomeStatus::Accepted,
            Self::Error { .. } => OutcomeStatus::Error,
        }
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            Self::LowConfidence { prediction } | Self::Accepted { prediction } => Some(prediction),
            _ => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}
