use crate::mask::{self, Mask, FOREGROUND};
use anyhow::Result;
use image::{imageops, Luma, RgbImage};
use ndarray::Array4;

/// Converts RGB frames to model input tensors and model output maps back to
/// binary masks at frame resolution.
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess an RGB image into a normalized NCHW tensor.
    ///
    /// Steps:
    /// 1. Resize to the model's input dimensions
    /// 2. Normalize channels to [0, 1]
    /// 3. Transpose from HWC to NCHW
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width]
    pub fn preprocess(&self, image: &RgbImage) -> Result<Array4<f32>> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = if image.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            )
        } else {
            image.clone()
        };

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in resized.enumerate_pixels() {
            tensor[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            tensor[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            tensor[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        Ok(tensor)
    }

    /// Threshold a flattened per-pixel foreground probability map into a
    /// binary mask, then resize it to the frame dimensions.
    pub fn postprocess_mask(
        probabilities: &[f32],
        map_width: u32,
        map_height: u32,
        threshold: f32,
        frame_width: u32,
        frame_height: u32,
    ) -> Mask {
        let _span = tracing::debug_span!("postprocess").entered();

        let binary = Mask::from_fn(map_width, map_height, |x, y| {
            let idx = (y * map_width + x) as usize;
            if probabilities[idx] >= threshold {
                Luma([FOREGROUND])
            } else {
                Luma([0])
            }
        });

        mask::resize_nearest(&binary, frame_width, frame_height)
    }
}
