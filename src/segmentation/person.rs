use super::preprocess::Preprocessor;
use super::types::SegmentationModel;
use crate::config::SegmentationConfig;
use crate::mask::Mask;
use anyhow::{bail, Context, Result};
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// ONNX person-segmentation model.
///
/// Expects a selfie-segmenter style network: one RGB input, one per-pixel
/// foreground probability map as output. Probabilities at or above the
/// configured threshold become foreground.
pub struct PersonSegmenter {
    session: Session,
    preprocessor: Preprocessor,
    width: u32,
    height: u32,
    foreground_threshold: f32,
}

impl PersonSegmenter {
    /// Load a model from an ONNX file.
    pub fn new<P: AsRef<Path>>(model_path: P, config: &SegmentationConfig) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading segmentation model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("Segmentation model loaded successfully");

        let width = config.input_size;
        let height = config.input_size;

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(width, height),
            width,
            height,
            foreground_threshold: config.foreground_threshold,
        })
    }
}

impl SegmentationModel for PersonSegmenter {
    fn segment(&mut self, frame: &RgbImage) -> Result<Mask> {
        let _span = tracing::debug_span!("model_segment").entered();

        let input = self.preprocessor.preprocess(frame)?;
        let input_tensor = Tensor::from_array(input)?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .context("Inference failed")?;
        drop(_infer_span);

        let output: ndarray::ArrayViewD<f32> = outputs[0]
            .try_extract_array()
            .context("Failed to extract output tensor")?;

        // Accept [1, 1, H, W] (NCHW) or [1, H, W, 1] (NHWC) probability maps.
        // Both flatten to the same row-major H*W order.
        let (map_height, map_width) = match output.shape() {
            &[1, 1, h, w] => (h, w),
            &[1, h, w, 1] => (h, w),
            other => bail!("Unsupported segmenter output shape {:?}", other),
        };

        let probabilities: Vec<f32> = output.iter().copied().collect();
        let (frame_width, frame_height) = frame.dimensions();

        Ok(Preprocessor::postprocess_mask(
            &probabilities,
            map_width as u32,
            map_height as u32,
            self.foreground_threshold,
            frame_width,
            frame_height,
        ))
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
