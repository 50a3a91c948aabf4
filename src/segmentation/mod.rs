mod background;
mod estimator;
mod person;
mod preprocess;
pub mod types;

pub use background::BackgroundModel;
pub use estimator::ForegroundEstimator;
pub use person::PersonSegmenter;
pub use preprocess::Preprocessor;
pub use types::SegmentationModel;

use crate::config::SegmentationConfig;
use anyhow::Result;

/// Create the default learned segmenter (ONNX person segmentation).
pub fn create_default_model(
    model_path: &str,
    config: &SegmentationConfig,
) -> Result<Box<dyn SegmentationModel>> {
    let model = PersonSegmenter::new(model_path, config)?;
    Ok(Box::new(model))
}
