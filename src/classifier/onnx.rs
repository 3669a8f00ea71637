use crate::classifier::{Classifier, ImageTensor};
use crate::core::config::InputLayout;
use crate::core::error::ClassifierError;
use std::path::Path;
use tract_onnx::prelude::*;

/// Pest network exported to ONNX, optimized once and run with tract
pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
    input_size: usize,
    layout: InputLayout,
}

impl OnnxClassifier {
    /// Deserialize and optimize the artifact for a fixed `[1, size, size, 3]`
    /// (or `[1, 3, size, size]`) input. Blocking and CPU heavy.
    pub fn load(path: &Path, input_size: u32, layout: InputLayout) -> Result<Self, ClassifierError> {
        let size = input_size as usize;
        let shape = match layout {
            InputLayout::Nhwc => [1, size, size, 3],
            InputLayout::Nchw => [1, 3, size, size],
        };

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact(shape).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| ClassifierError::Deserialize(format!("{}: {:#}", path.display(), e)))?;

        Ok(Self {
            plan,
            input_size: size,
            layout,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        let expected = self.input_size * self.input_size * 3;
        let shape_ok = input.height() == self.input_size
            && input.width() == self.input_size
            && input.channels() == 3;
        if !shape_ok || input.data.len() != expected {
            return Err(ClassifierError::InputShape {
                expected,
                actual: input.data.len(),
            });
        }

        let tensor = match self.layout {
            InputLayout::Nhwc => Tensor::from_shape(&input.shape, &input.data),
            InputLayout::Nchw => {
                let [batch, height, width, channels] = input.shape;
                Tensor::from_shape(&[batch, channels, height, width], &input.to_nchw())
            }
        }
        .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ClassifierError::Inference(format!("{:#}", e)))?;

        let scores = outputs
            .first()
            .ok_or(ClassifierError::EmptyOutput)?
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?
            .iter()
            .copied()
            .collect::<Vec<f32>>();

        if scores.is_empty() {
            return Err(ClassifierError::EmptyOutput);
        }

        Ok(scores)
    }
}
