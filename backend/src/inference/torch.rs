use std::path::Path;
use tch::{CModule, Device, Kind, Tensor};

use super::{InferenceAdapter, InferenceError, ModelPrecision, NormalizedImage, ProbabilityVector};

/// Runs a TorchScript export. Quantized artifacts stay on the CPU since
/// quantized kernels are CPU-only; full-precision ones use CUDA when present.
pub struct TorchScriptRunner {
    model: CModule,
    device: Device,
    apply_softmax: bool,
    name: String,
}

impl TorchScriptRunner {
    pub fn load(
        model_path: &Path,
        precision: ModelPrecision,
        apply_softmax: bool,
    ) -> Result<Self, InferenceError> {
        if !model_path.exists() {
            return Err(InferenceError::Unavailable(format!(
                "no model artifact at {}",
                model_path.display()
            )));
        }
        let device = match precision {
            ModelPrecision::Quantized => Device::Cpu,
            ModelPrecision::Full => Device::cuda_if_available(),
        };
        let model = CModule::load_on_device(model_path, device)?;
        let name = match precision {
            ModelPrecision::Quantized => "torchscript-quantized",
            ModelPrecision::Full => "torchscript-full",
        };
        log::info!("Loaded {} model from {} on {:?}", name, model_path.display(), device);
        Ok(Self {
            model,
            device,
            apply_softmax,
            name: name.to_string(),
        })
    }
}

impl InferenceAdapter for TorchScriptRunner {
    fn name(&self) -> &str {
        &self.name
    }

    fn infer(&mut self, input: &NormalizedImage) -> Result<ProbabilityVector, InferenceError> {
        let side = input.side() as i64;
        let data: Vec<f32> = input.tensor().iter().copied().collect();
        let tensor = Tensor::from_slice(&data)
            .view([1, side, side, 3])
            .permute([0, 3, 1, 2])
            .to_device(self.device);

        let output = tch::no_grad(|| self.model.forward_ts(&[tensor]))?;
        let output = if self.apply_softmax {
            output.softmax(-1, Kind::Float)
        } else {
            output
        };
        let output_flat = output.to_kind(Kind::Float).to_device(Device::Cpu).view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut output_vec = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut output_vec, num_elements);
        Ok(ProbabilityVector::from_f32(&output_vec))
    }
}
