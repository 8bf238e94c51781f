use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{InferenceAdapter, InferenceError, NormalizedImage, ProbabilityVector};

/// Used when no model artifact is available: uniform draws normalised to sum
/// to one. A seed makes the sequence repeatable across restarts.
pub struct RandomFallback {
    rng: StdRng,
    classes: usize,
}

impl RandomFallback {
    pub fn new(classes: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng, classes }
    }
}

impl InferenceAdapter for RandomFallback {
    fn name(&self) -> &str {
        "random-fallback"
    }

    fn output_len(&self) -> Option<usize> {
        Some(self.classes)
    }

    fn infer(&mut self, _input: &NormalizedImage) -> Result<ProbabilityVector, InferenceError> {
        if self.classes == 0 {
            return Err(InferenceError::Backend("no classes to draw from".into()));
        }
        let draws: Vec<f64> = (0..self.classes)
            .map(|_| self.rng.random::<f64>())
            .collect();
        let sum: f64 = draws.iter().sum();
        let values = if sum > 0.0 {
            draws.iter().map(|v| v / sum).collect()
        } else {
            vec![1.0 / self.classes as f64; self.classes]
        };
        Ok(ProbabilityVector::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn input() -> NormalizedImage {
        NormalizedImage::from_rgb(&RgbImage::from_pixel(4, 4, Rgb([0, 200, 0])), 8).unwrap()
    }

    #[test]
    fn output_is_normalised() {
        let mut adapter = RandomFallback::new(5, None);
        for _ in 0..20 {
            let v = adapter.infer(&input()).unwrap();
            assert_eq!(v.len(), 5);
            assert!((v.sum() - 1.0).abs() < 1e-9);
            assert!(v.values().iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn seeded_runs_repeat() {
        let mut a = RandomFallback::new(4, Some(42));
        let mut b = RandomFallback::new(4, Some(42));
        for _ in 0..3 {
            assert_eq!(a.infer(&input()).unwrap(), b.infer(&input()).unwrap());
        }
    }
}
