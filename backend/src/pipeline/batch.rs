use image::RgbImage;

use super::{DiagnosisPipeline, PipelineOutcome};
use crate::error::ConfigurationError;
use crate::history::History;
use crate::inference::decode_rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Processed,
    NoImagesSupplied,
}

/// One outcome per input, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub outcomes: Vec<PipelineOutcome>,
}

impl BatchReport {
    pub fn no_images_supplied(&self) -> bool {
        self.status == BatchStatus::NoImagesSupplied
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

pub fn run_batch(
    pipeline: &mut DiagnosisPipeline,
    images: &[RgbImage],
    history: &mut History,
) -> Result<BatchReport, ConfigurationError> {
    aggregate(pipeline, images, history, |pipeline, image, history| {
        pipeline.run(image, history)
    })
}

/// Like [`run_batch`], but undecodable payloads become `Error` outcomes at
/// their own position.
pub fn run_encoded_batch(
    pipeline: &mut DiagnosisPipeline,
    payloads: &[Vec<u8>],
    history: &mut History,
) -> Result<BatchReport, ConfigurationError> {
    aggregate(pipeline, payloads, history, |pipeline, bytes, history| {
        match decode_rgb(bytes) {
            Ok(image) => pipeline.run(&image, history),
            Err(e) => Ok(PipelineOutcome::error(e)),
        }
    })
}

fn aggregate<T, F>(
    pipeline: &mut DiagnosisPipeline,
    items: &[T],
    history: &mut History,
    mut run_one: F,
) -> Result<BatchReport, ConfigurationError>
where
    F: FnMut(&mut DiagnosisPipeline, &T, &mut History) -> Result<PipelineOutcome, ConfigurationError>,
{
    if items.is_empty() {
        log::info!("Batch request carried no images");
        return Ok(BatchReport {
            status: BatchStatus::NoImagesSupplied,
            outcomes: Vec::new(),
        });
    }

    // Records land in a copy that replaces `history` only once every image
    // has been processed, so a fatal error leaves it untouched.
    let mut staged = history.clone();
    let total = items.len();
    let mut outcomes = Vec::with_capacity(total);
    for (i, item) in items.iter().enumerate() {
        let outcome = run_one(pipeline, item, &mut staged)?;
        if let PipelineOutcome::Error { message } = &outcome {
            log::warn!("Image {} of {} failed: {}", i + 1, total, message);
        }
        outcomes.push(outcome);
    }

    log::info!(
        "Batch of {} processed, {} accepted",
        total,
        outcomes.iter().filter(|o| o.is_accepted()).count()
    );
    *history = staged;
    Ok(BatchReport {
        status: BatchStatus::Processed,
        outcomes,
    })
}
