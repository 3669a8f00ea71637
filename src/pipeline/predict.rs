use crate::classifier::Classifier;
use crate::core::error::{ClassifierError, PipelineError};
use crate::labels::table::LabelTable;
use crate::models::prediction::PredictionResult;
use crate::pipeline::preprocess::preprocess;
use std::sync::Arc;

/// Index of the largest score, lowest index on ties. NaN never wins.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }

    best.map(|(index, _)| index)
}

/// Decode, normalize, infer, arg-max, resolve. One image per call.
#[derive(Clone)]
pub struct PredictionPipeline {
    classifier: Arc<dyn Classifier>,
    labels: Arc<LabelTable>,
    input_size: u32,
}

impl PredictionPipeline {
    pub fn new(classifier: Arc<dyn Classifier>, labels: Arc<LabelTable>, input_size: u32) -> Self {
        Self {
            classifier,
            labels,
            input_size,
        }
    }

    pub fn predict(&self, raw_image: &[u8]) -> Result<PredictionResult, PipelineError> {
        let tensor = preprocess(raw_image, self.input_size)?;
        let confidences = self.classifier.infer(&tensor)?;
        let class_index = argmax(&confidences).ok_or(ClassifierError::EmptyOutput)?;
        let label = self.labels.resolve(class_index).cloned();

        Ok(PredictionResult {
            class_index,
            confidences,
            label,
        })
    }
}
