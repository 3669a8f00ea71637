//! Pest classifier: the inference seam, the ONNX backend, the model hub
//! client and the load-once wrapper that ties them together.

pub mod hub;
pub mod loader;
pub mod onnx;

use crate::core::error::ClassifierError;

/// A single preprocessed image with its batch dimension, NHWC order
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    /// [batch, height, width, channels]
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

impl ImageTensor {
    pub fn height(&self) -> usize {
        self.shape[1]
    }

    pub fn width(&self) -> usize {
        self.shape[2]
    }

    pub fn channels(&self) -> usize {
        self.shape[3]
    }

    /// Same values reordered to [batch, channels, height, width]
    pub fn to_nchw(&self) -> Vec<f32> {
        let [batch, height, width, channels] = self.shape;
        let plane = height * width;
        let mut out = vec![0.0f32; self.data.len()];

        for b in 0..batch {
            let base = b * plane * channels;
            for pixel in 0..plane {
                for c in 0..channels {
                    out[base + c * plane + pixel] = self.data[base + pixel * channels + c];
                }
            }
        }

        out
    }
}

/// Anything that turns a preprocessed image into per-class scores.
///
/// Implementations must be deterministic and must not mutate themselves,
/// one instance is shared by every request.
pub trait Classifier: Send + Sync {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, ClassifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_nchw() {
        // 1x1x2 image, 3 channels: pixel0 = (1,2,3), pixel1 = (4,5,6)
        let tensor = ImageTensor {
            shape: [1, 1, 2, 3],
            data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        };

        assert_eq!(tensor.to_nchw(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(tensor.height(), 1);
        assert_eq!(tensor.width(), 2);
        assert_eq!(tensor.channels(), 3);
    }
}
