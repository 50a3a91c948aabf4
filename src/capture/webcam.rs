use super::CaptureSource;
use anyhow::{Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

/// Webcam capture via nokhwa, with optional horizontal mirroring so the
/// player sees themselves as in a mirror.
pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
    mirror: bool,
}

impl WebcamCapture {
    pub fn new(device_index: u32, width: u32, height: u32, mirror: bool) -> Result<Self> {
        tracing::info!(
            "Initializing webcam {} at {}x{}",
            device_index,
            width,
            height
        );

        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let mut camera = Camera::new(index, requested).context("Failed to open camera")?;

        camera
            .open_stream()
            .context("Failed to open camera stream")?;

        tracing::info!("Webcam initialized successfully");

        Ok(Self {
            camera,
            width,
            height,
            mirror,
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        // A dropped frame is "no observation this tick", not a fatal error
        let frame = match self.camera.frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Frame capture failed: {e}");
                return Ok(None);
            }
        };

        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;

        let decoded = if self.mirror {
            image::imageops::flip_horizontal(&decoded)
        } else {
            decoded
        };

        Ok(Some(decoded))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
