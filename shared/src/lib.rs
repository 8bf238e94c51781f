use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Severity {
    None,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RejectionCategory {
    Anomaly,
    InsufficientVegetation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeStatus {
    Rejected,
    LowConfidence,
    Accepted,
    Error,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionDto {
    pub label: String,
    pub probability: f64,
    /// Percentage in `[0, 100]`.
    pub confidence: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DiseaseInfoDto {
    pub name: String,
    pub icon: String,
    pub severity: Severity,
    pub description: String,
    pub symptoms: String,
    pub treatment: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InferenceResponse {
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<RejectionCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease: Option<DiseaseInfoDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub predictions: Vec<f64>,
    pub class_labels: Vec<String>,
    pub report: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BatchResponse {
    pub no_images_supplied: bool,
    pub results: Vec<InferenceResponse>,
    pub report: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryEntryDto {
    pub id: Uuid,
    pub label: String,
    pub confidence: f64,
    pub thumbnail: String,
    pub image_hash: String,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryResponse {
    pub total_recorded: usize,
    pub entries: Vec<HistoryEntryDto>,
    pub report: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub service: String,
    pub adapter: String,
    pub class_labels: Vec<String>,
}
