pub mod admission;
pub mod config;
pub mod disease;
pub mod error;
pub mod history;
pub mod inference;
pub mod pipeline;
pub mod report;
pub mod routes;
pub mod service;

pub use config::AppConfig;
pub use error::ConfigurationError;
pub use history::{History, HistoryEntry};
pub use pipeline::{BatchReport, BatchStatus, DiagnosisPipeline, PipelineOutcome, Prediction};
pub use service::DiagnosisService;
