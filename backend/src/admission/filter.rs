use image::RgbImage;
use shared::RejectionCategory;

use super::anomaly::{AnomalyDetector, NoAnomalyDetector, SkinRegionDetector};
use super::hsv::rgb_to_hsv;
use super::AdmissibilityError;
use crate::config::AdmissionConfig;

pub const REASON_ANOMALY: &str = "anomaly image detected";
pub const REASON_NO_VEGETATION: &str = "insufficient vegetation detected";
pub const REASON_VALID: &str = "valid image";
pub const REASON_FAIL_OPEN: &str = "analysis completed";

#[derive(Debug, Clone, PartialEq)]
pub struct AdmissibilityResult {
    pub admissible: bool,
    pub reason: String,
    pub category: Option<RejectionCategory>,
}

impl AdmissibilityResult {
    fn admit(reason: &str) -> Self {
        Self {
            admissible: true,
            reason: reason.to_string(),
            category: None,
        }
    }

    fn reject(reason: &str, category: RejectionCategory) -> Self {
        Self {
            admissible: false,
            reason: reason.to_string(),
            category: Some(category),
        }
    }
}

/// Pixels count as vegetation when their hue lies inside
/// `[hue_min_deg, hue_max_deg]` and saturation/value reach the floors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VegetationBand {
    pub hue_min_deg: f32,
    pub hue_max_deg: f32,
    pub min_saturation: u8,
    pub min_value: u8,
    pub min_fraction: f32,
}

impl Default for VegetationBand {
    fn default() -> Self {
        Self::from(&AdmissionConfig::default())
    }
}

impl From<&AdmissionConfig> for VegetationBand {
    fn from(config: &AdmissionConfig) -> Self {
        Self {
            hue_min_deg: config.hue_min_deg,
            hue_max_deg: config.hue_max_deg,
            min_saturation: config.min_saturation,
            min_value: config.min_value,
            min_fraction: config.min_green_fraction,
        }
    }
}

impl VegetationBand {
    pub fn contains(&self, r: u8, g: u8, b: u8) -> bool {
        let hsv = rgb_to_hsv(r, g, b);
        hsv.h >= self.hue_min_deg
            && hsv.h <= self.hue_max_deg
            && hsv.s >= self.min_saturation
            && hsv.v >= self.min_value
    }

    pub fn coverage(&self, image: &RgbImage) -> Result<f32, AdmissibilityError> {
        let total = image.width() as u64 * image.height() as u64;
        if total == 0 {
            return Err(AdmissibilityError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }
        let green = image
            .pixels()
            .filter(|p| self.contains(p[0], p[1], p[2]))
            .count();
        Ok(green as f32 / total as f32)
    }
}

pub struct AdmissibilityFilter {
    band: VegetationBand,
    detector: Box<dyn AnomalyDetector>,
}

impl AdmissibilityFilter {
    pub fn new(band: VegetationBand, detector: Box<dyn AnomalyDetector>) -> Self {
        Self { band, detector }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        let detector: Box<dyn AnomalyDetector> = if config.anomaly.enabled {
            Box::new(SkinRegionDetector::from(&config.anomaly))
        } else {
            Box::new(NoAnomalyDetector)
        };
        Self::new(VegetationBand::from(config), detector)
    }

    /// Never blocks on its own failures: any internal error admits the image.
    pub fn check(&self, image: &RgbImage) -> AdmissibilityResult {
        match self.evaluate(image) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Admissibility check failed open: {}", e);
                AdmissibilityResult::admit(REASON_FAIL_OPEN)
            }
        }
    }

    fn evaluate(&self, image: &RgbImage) -> Result<AdmissibilityResult, AdmissibilityError> {
        if self.detector.detect(image)? {
            log::info!("Rejected image: {} flagged an anomaly", self.detector.name());
            return Ok(AdmissibilityResult::reject(
                REASON_ANOMALY,
                RejectionCategory::Anomaly,
            ));
        }

        let coverage = self.band.coverage(image)?;
        if coverage < self.band.min_fraction {
            log::info!(
                "Rejected image: vegetation coverage {:.1}% below {:.1}%",
                coverage * 100.0,
                self.band.min_fraction * 100.0
            );
            return Ok(AdmissibilityResult::reject(
                REASON_NO_VEGETATION,
                RejectionCategory::InsufficientVegetation,
            ));
        }

        Ok(AdmissibilityResult::admit(REASON_VALID))
    }
}
