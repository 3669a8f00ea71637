use crate::classifier::ImageTensor;
use crate::core::error::PipelineError;
use image::imageops::{self, FilterType};

/// Decode an uploaded image and turn it into the classifier's input:
/// RGB, stretched to `size` x `size` (no aspect-ratio preservation),
/// values scaled into [0, 1], batch dimension of one, NHWC.
pub fn preprocess(raw: &[u8], size: u32) -> Result<ImageTensor, PipelineError> {
    let decoded = image::load_from_memory(raw)
        .map_err(|e| PipelineError::InvalidImage(e.to_string()))?;

    let rgb = decoded.to_rgb8();
    let resized = imageops::resize(&rgb, size, size, FilterType::CatmullRom);

    let data = resized
        .into_raw()
        .into_iter()
        .map(|value| f32::from(value) / 255.0)
        .collect::<Vec<f32>>();

    Ok(ImageTensor {
        shape: [1, size as usize, size as usize, 3],
        data,
    })
}
