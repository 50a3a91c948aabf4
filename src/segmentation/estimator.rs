use super::background::BackgroundModel;
use super::types::SegmentationModel;
use crate::config::{RefineConfig, SegmentationConfig};
use crate::mask::{self, morphology, Mask};
use image::RgbImage;

/// Fuses the learned segmenter with adaptive background subtraction.
///
/// The two sub-masks are combined with logical OR, so either technique's
/// detection is enough. That trades false positives for recall: missed body
/// pixels directly lower the coverage score, stray ones only raise excess.
pub struct ForegroundEstimator {
    model: Option<Box<dyn SegmentationModel>>,
    background: BackgroundModel,
    config: SegmentationConfig,
    refine: RefineConfig,
}

impl ForegroundEstimator {
    pub fn new(
        model: Option<Box<dyn SegmentationModel>>,
        background: BackgroundModel,
        config: SegmentationConfig,
        refine: RefineConfig,
    ) -> Self {
        Self {
            model,
            background,
            config,
            refine,
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Estimate the body mask for one frame, smoothed and at frame
    /// resolution. A failing model contributes an empty mask instead of
    /// aborting the frame.
    pub fn estimate(&mut self, frame: &RgbImage) -> Mask {
        let (width, height) = frame.dimensions();

        let raw_model_mask = match self.model.as_mut() {
            Some(model) => match model.segment(frame) {
                Ok(m) => Some(m),
                Err(e) => {
                    tracing::warn!("Segmentation model failed, dropping its mask this frame: {e:#}");
                    None
                }
            },
            None => None,
        };

        let model_mask = match raw_model_mask {
            Some(m) => {
                let m = mask::resize_nearest(&m, width, height);
                // The classifier occasionally swaps category indices and
                // labels the background as person. An implausible foreground
                // share means the mask is inverted. Heuristic, not a
                // guarantee.
                if mask::foreground_fraction(&m) > self.config.inversion_fraction {
                    tracing::debug!("Model mask mostly foreground, treating as inverted");
                    mask::invert(&m)
                } else {
                    m
                }
            }
            None => mask::empty(width, height),
        };

        let motion_mask = self.background.apply(frame);

        let fused =
            mask::union(&model_mask, &motion_mask).expect("sub-masks share frame dimensions");

        morphology::smooth(
            &fused,
            self.refine.smooth_kernel,
            self.refine.smooth_dilate_iters,
            self.refine.smooth_close_iters,
        )
    }

    /// Drop all temporal state (background estimate, model recurrence).
    pub fn reset(&mut self) {
        self.background.reset();
        if let Some(model) = self.model.as_mut() {
            model.reset_state();
        }
    }
}
