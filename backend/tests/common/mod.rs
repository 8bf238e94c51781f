#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cassava_backend::inference::{
    InferenceAdapter, InferenceError, NormalizedImage, ProbabilityVector,
};
use cassava_backend::{AppConfig, DiagnosisPipeline};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

pub const LEAF_GREEN: Rgb<u8> = Rgb([40, 160, 40]);
pub const SKIN: Rgb<u8> = Rgb([224, 172, 105]);
pub const GREY_BLUE: Rgb<u8> = Rgb([110, 110, 120]);
pub const SOIL: Rgb<u8> = Rgb([139, 90, 43]);

pub const HEALTHY: [f64; 5] = [0.05, 0.05, 0.1, 0.1, 0.7];
pub const UNSURE: [f64; 5] = [0.3, 0.25, 0.2, 0.15, 0.1];

pub fn all_green(side: u32) -> RgbImage {
    RgbImage::from_pixel(side, side, LEAF_GREEN)
}

pub fn solid(side: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(side, side, color)
}

/// Upright skin-toned oval on a grey backdrop, roughly a portrait.
pub fn face(side: u32) -> RgbImage {
    let centre = side as f32 / 2.0;
    let (rx, ry) = (side as f32 * 0.2, side as f32 * 0.28);
    RgbImage::from_fn(side, side, |x, y| {
        let dx = (x as f32 + 0.5 - centre) / rx;
        let dy = (y as f32 + 0.5 - centre) / ry;
        if dx * dx + dy * dy <= 1.0 { SKIN } else { GREY_BLUE }
    })
}

/// Leaf across the top 40% of the frame, bare soil below.
pub fn leaf_on_soil(side: u32) -> RgbImage {
    RgbImage::from_fn(side, side, |_, y| {
        if y * 10 < side * 4 { LEAF_GREEN } else { SOIL }
    })
}

pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("png encoding");
    buffer.into_inner()
}

/// Vector with `peak` at `index` and the rest spread evenly.
pub fn peaked(index: usize, peak: f64, classes: usize) -> Vec<f64> {
    let rest = (1.0 - peak) / (classes - 1) as f64;
    (0..classes).map(|i| if i == index { peak } else { rest }).collect()
}

/// Replays a fixed script of outputs, cycling when it runs out.
pub struct ScriptedAdapter {
    script: Vec<Result<Vec<f64>, String>>,
    declared_len: Option<usize>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAdapter {
    pub fn new(script: Vec<Result<Vec<f64>, String>>) -> Self {
        let declared_len = script.iter().find_map(|step| step.as_ref().ok().map(Vec::len));
        Self {
            script,
            declared_len,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn constant(values: &[f64]) -> Self {
        Self::new(vec![Ok(values.to_vec())])
    }

    pub fn undeclared(mut self) -> Self {
        self.declared_len = None;
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl InferenceAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn output_len(&self) -> Option<usize> {
        self.declared_len
    }

    fn infer(&mut self, input: &NormalizedImage) -> Result<ProbabilityVector, InferenceError> {
        assert_eq!(input.tensor().shape(), &[1, 224, 224, 3]);
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script[call % self.script.len()] {
            Ok(values) => Ok(ProbabilityVector::new(values.clone())),
            Err(message) => Err(InferenceError::Backend(message.clone())),
        }
    }
}

pub fn pipeline_with(adapter: ScriptedAdapter) -> DiagnosisPipeline {
    DiagnosisPipeline::from_config(&AppConfig::default(), Box::new(adapter))
        .expect("default config is valid")
}

pub const BOUNDARY: &str = "----leafboundary7MA4YWxkTrZu0gW";

pub fn multipart_body(files: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (i, bytes) in files.iter().enumerate() {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"images\"; filename=\"leaf_{}.png\"\r\n",
                i + 1
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
