use chrono::{Local, Timelike};
use image::RgbImage;
use uuid::Uuid;

use super::thumbnail::{calculate_image_hash, encode_data_uri};
use super::{History, HistoryEntry};
use crate::config::HistoryConfig;
use crate::pipeline::Prediction;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Thumbnail encoding failed: {0}")]
    Thumbnail(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy)]
pub struct ResultRecorder {
    thumbnail_max_side: u32,
    jpeg_quality: u8,
}

impl Default for ResultRecorder {
    fn default() -> Self {
        Self::from(&HistoryConfig::default())
    }
}

impl From<&HistoryConfig> for ResultRecorder {
    fn from(config: &HistoryConfig) -> Self {
        Self {
            thumbnail_max_side: config.thumbnail_max_side,
            jpeg_quality: config.jpeg_quality,
        }
    }
}

impl ResultRecorder {
    pub fn record(
        &self,
        image: &RgbImage,
        prediction: &Prediction,
        history: &mut History,
    ) -> Result<HistoryEntry, RecordError> {
        let thumbnail = encode_data_uri(image, self.thumbnail_max_side, self.jpeg_quality)?;
        let now = Local::now();
        let timestamp = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);

        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            label: prediction.label.clone(),
            confidence: (prediction.confidence * 10.0).round() / 10.0,
            thumbnail,
            image_hash: calculate_image_hash(image),
            timestamp,
        };
        log::info!(
            "Recorded {} ({:.1}%) as history entry {}",
            entry.label,
            entry.confidence,
            entry.id
        );
        history.append(entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn prediction(confidence: f64) -> Prediction {
        Prediction {
            label: "Healthy".into(),
            index: 4,
            probability: confidence / 100.0,
            confidence,
            scores: vec![],
        }
    }

    #[test]
    fn record_appends_a_minute_granular_entry() {
        let mut history = History::default();
        let image = RgbImage::from_pixel(640, 480, Rgb([40, 160, 40]));
        let entry = ResultRecorder::default()
            .record(&image, &prediction(72.345), &mut history)
            .unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history.recent()[0], entry);
        assert_eq!(entry.confidence, 72.3);
        assert_eq!(entry.timestamp.second(), 0);
        assert_eq!(entry.timestamp.nanosecond(), 0);
        assert!(entry.thumbnail.starts_with("data:image/jpeg;base64,"));
        assert_eq!(entry.timestamp_display().len(), "2024-01-01 12:00".len());
    }
}
