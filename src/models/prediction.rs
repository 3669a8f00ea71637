use crate::models::label::LabelEntry;

/// Outcome of one pass through the prediction pipeline
#[derive(Clone, Debug)]
pub struct PredictionResult {
    pub class_index: usize,
    /// Raw per-class scores, not necessarily normalized
    pub confidences: Vec<f32>,
    /// None when the model predicted an index the label table lacks
    pub label: Option<LabelEntry>,
}

impl PredictionResult {
    pub fn is_recognized(&self) -> bool {
        self.label.is_some()
    }

    /// Score of the winning class
    pub fn confidence(&self) -> f32 {
        self.confidences
            .get(self.class_index)
            .copied()
            .unwrap_or(0.0)
    }
}
