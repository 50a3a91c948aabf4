use crate::mask::Mask;
use anyhow::Result;
use image::RgbImage;

/// Trait for learned person-segmentation backends.
///
/// The engine treats the model as a black box that labels each pixel as
/// person or background. Backends are swappable (ONNX selfie segmenters,
/// matting networks thresholded at the caller, ...).
pub trait SegmentationModel {
    /// Segment one frame into a binary person mask.
    ///
    /// The returned mask must have the same dimensions as the input frame.
    fn segment(&mut self, frame: &RgbImage) -> Result<Mask>;

    /// Reset internal state (for models with temporal components).
    ///
    /// Call this when switching cameras or starting a new session.
    fn reset_state(&mut self) {
        // Default implementation: no-op for stateless models
    }

    /// The model's preferred input dimensions (width, height).
    fn input_size(&self) -> (u32, u32);
}
