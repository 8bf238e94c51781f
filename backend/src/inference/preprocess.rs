use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

use super::InferenceError;

/// Model input: `[1, size, size, 3]` (NHWC) with channels scaled to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    tensor: Array4<f32>,
}

impl NormalizedImage {
    pub fn from_rgb(image: &RgbImage, size: u32) -> Result<Self, InferenceError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(InferenceError::Preprocessing(format!(
                "Image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }
        let resized = imageops::resize(image, size, size, FilterType::Triangle);
        let side = size as usize;
        let tensor = Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
            f32::from(resized.get_pixel(x as u32, y as u32)[c]) / 255.0
        });
        Ok(Self { tensor })
    }

    pub fn tensor(&self) -> &Array4<f32> {
        &self.tensor
    }

    pub fn side(&self) -> usize {
        self.tensor.shape()[1]
    }
}

pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, InferenceError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| InferenceError::Preprocessing(format!("Unreadable image: {}", e)))
}
