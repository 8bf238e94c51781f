use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageError, RgbImage};
use sha2::{Digest, Sha256};

/// Largest size with the same aspect ratio that fits in `max_side` squared.
/// Never upscales.
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    if width <= max_side && height <= max_side {
        return (width, height);
    }
    let scale = f64::from(max_side) / f64::from(width.max(height));
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w.min(max_side), h.min(max_side))
}

pub fn downscale(image: &RgbImage, max_side: u32) -> RgbImage {
    let (w, h) = fit_within(image.width(), image.height(), max_side);
    if (w, h) == image.dimensions() {
        image.clone()
    } else {
        imageops::resize(image, w, h, FilterType::Lanczos3)
    }
}

pub fn encode_data_uri(image: &RgbImage, max_side: u32, quality: u8) -> Result<String, ImageError> {
    let thumb = downscale(image, max_side);
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(&thumb)?;
    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&buffer)))
}

pub fn calculate_image_hash(image: &RgbImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image.width().to_le_bytes());
    hasher.update(image.height().to_le_bytes());
    hasher.update(image.as_raw());
    hex::encode(hasher.finalize())
}
