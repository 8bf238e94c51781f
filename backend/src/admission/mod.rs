//! Heuristic pre-filter deciding whether an image is a plausible leaf photo
//! before it reaches the model.

pub mod anomaly;
pub mod filter;
pub mod hsv;

pub use anomaly::{is_skin, skin_regions, AnomalyDetector, NoAnomalyDetector, SkinRegion, SkinRegionDetector};
pub use filter::{AdmissibilityFilter, AdmissibilityResult, VegetationBand};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdmissibilityError {
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("Anomaly detector failed: {0}")]
    Detector(String),
}
