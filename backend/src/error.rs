/// Deployment contract violations. These indicate a broken configuration or
/// a model that does not match the label set, and are never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Label set is empty")]
    EmptyLabelSet,
    #[error("Duplicate label in label set: {0}")]
    DuplicateLabel(String),
    #[error("No disease information configured for label: {0}")]
    MissingDiseaseInfo(String),
    #[error("Probability vector is empty")]
    EmptyProbabilities,
    #[error("Probability vector has {actual} entries but the label set has {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Probability vector sums to {sum}, outside tolerance {tolerance}")]
    NotNormalized { sum: f64, tolerance: f64 },
    #[error("Probability vector holds an invalid value at index {index}: {value}")]
    InvalidProbability { index: usize, value: f64 },
    #[error("Invalid setting `{field}`: {message}")]
    InvalidSetting { field: &'static str, message: String },
    #[error("Startup probe of the inference adapter failed: {0}")]
    ProbeFailed(String),
    #[error("No inference strategy could be initialised")]
    NoInferenceStrategy,
}
