//! Boundary around the probability-producing model. The pipeline only relies
//! on [`InferenceAdapter`]; which strategy sits behind it is decided once at
//! startup by [`strategy::select_adapter`].

pub mod preprocess;
pub mod random;
pub mod strategy;
#[cfg(feature = "torch")]
pub mod torch;

pub use preprocess::{decode_rgb, NormalizedImage};
pub use random::RandomFallback;
pub use strategy::select_adapter;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Preprocessing error: {0}")]
    Preprocessing(String),
    #[cfg(feature = "torch")]
    #[error("Model error: {0}")]
    Model(#[from] tch::TchError),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Model unavailable: {0}")]
    Unavailable(String),
    #[error("Model produced an invalid score {value} at index {index}")]
    InvalidOutput { index: usize, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPrecision {
    Quantized,
    Full,
}

/// One score per label, in label-set order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityVector(Vec<f64>);

impl ProbabilityVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn from_f32(values: &[f32]) -> Self {
        Self(values.iter().map(|&v| f64::from(v)).collect())
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Index and value of the largest entry; ties resolve to the lowest index.
    pub fn argmax(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.0.iter().enumerate() {
            if v.is_nan() {
                continue;
            }
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((i, v)),
            }
        }
        best
    }
}

impl From<Vec<f64>> for ProbabilityVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

pub trait InferenceAdapter: Send {
    fn name(&self) -> &str;

    /// Length of every vector this adapter produces, when known without
    /// running the model.
    fn output_len(&self) -> Option<usize> {
        None
    }

    fn infer(&mut self, input: &NormalizedImage) -> Result<ProbabilityVector, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_of_equal_maxima() {
        let v = ProbabilityVector::new(vec![0.1, 0.4, 0.4, 0.1]);
        assert_eq!(v.argmax(), Some((1, 0.4)));
    }

    #[test]
    fn argmax_skips_nan() {
        let v = ProbabilityVector::new(vec![f64::NAN, 0.2, 0.8]);
        assert_eq!(v.argmax(), Some((2, 0.8)));
    }

    #[test]
    fn argmax_of_empty_is_none() {
        assert_eq!(ProbabilityVector::new(vec![]).argmax(), None);
    }

    #[test]
    fn from_f32_widens_values() {
        let v = ProbabilityVector::from_f32(&[0.25, 0.75]);
        assert_eq!(v.values(), &[0.25, 0.75]);
        assert_eq!(v.sum(), 1.0);
    }
}
