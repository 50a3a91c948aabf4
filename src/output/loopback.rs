use super::OutputSink;
use anyhow::{Context, Result};
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, Format, FourCC};

/// Writes frames to a v4l2loopback device so any V4L2 consumer (player,
/// browser, compositor) can display the game view.
pub struct V4L2Output {
    file: File,
    width: u32,
    height: u32,
}

impl V4L2Output {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        // Negotiate the frame format first so consumers see YUYV at the
        // right geometry
        let device = Device::with_path(path)
            .with_context(|| format!("Failed to open v4l2 device at {}", path.display()))?;
        let format = Format::new(width, height, FourCC::new(b"YUYV"));
        Output::set_format(&device, &format)
            .context("Failed to set YUYV format on loopback device")?;
        drop(device);

        // v4l2loopback accepts raw frame data written to the device file
        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open loopback device at {}", path.display()))?;

        tracing::info!("v4l2loopback device opened successfully");

        Ok(Self {
            file,
            width,
            height,
        })
    }

    /// Pack an RGB frame into YUV422 (YUYV): two pixels share one chroma
    /// sample, so each pixel pair becomes Y0 U Y1 V.
    fn rgb_to_yuyv(frame: &RgbImage) -> Vec<u8> {
        let (width, height) = frame.dimensions();
        let mut yuyv = Vec::with_capacity((width * height * 2) as usize);

        for y in 0..height {
            for x in (0..width).step_by(2) {
                let left = frame.get_pixel(x, y);
                let right = if x + 1 < width {
                    frame.get_pixel(x + 1, y)
                } else {
                    left
                };

                let (y0, u0, v0) = rgb_to_yuv(left[0], left[1], left[2]);
                let (y1, u1, v1) = rgb_to_yuv(right[0], right[1], right[2]);

                yuyv.push(y0);
                yuyv.push(((u0 as u16 + u1 as u16) / 2) as u8);
                yuyv.push(y1);
                yuyv.push(((v0 as u16 + v1 as u16) / 2) as u8);
            }
        }

        yuyv
    }
}

/// BT.601 RGB to YUV conversion
fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;

    let y = (0.299 * r + 0.587 * g + 0.114 * b).clamp(0.0, 255.0) as u8;
    let u = ((-0.147 * r - 0.289 * g + 0.436 * b) + 128.0).clamp(0.0, 255.0) as u8;
    let v = ((0.615 * r - 0.515 * g - 0.100 * b) + 128.0).clamp(0.0, 255.0) as u8;

    (y, u, v)
}

impl OutputSink for V4L2Output {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let frame = if frame.dimensions() != (self.width, self.height) {
            image::imageops::resize(
                frame,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            )
        } else {
            frame.clone()
        };

        let yuyv = Self::rgb_to_yuyv(&frame);

        self.file
            .write_all(&yuyv)
            .context("Failed to write frame to loopback device")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_packing_size_and_luma() {
        let frame = RgbImage::from_pixel(4, 2, image::Rgb([255, 255, 255]));
        let yuyv = V4L2Output::rgb_to_yuyv(&frame);
        // Two bytes per pixel
        assert_eq!(yuyv.len(), 16);
        // White: full luma, neutral chroma
        assert_eq!(yuyv[0], 255);
        assert!((yuyv[1] as i16 - 128).abs() <= 1);
        assert!((yuyv[3] as i16 - 128).abs() <= 1);
    }

    #[test]
    fn test_black_frame_luma_floor() {
        let frame = RgbImage::new(2, 1);
        let yuyv = V4L2Output::rgb_to_yuyv(&frame);
        assert_eq!(yuyv[0], 0);
        assert_eq!(yuyv[2], 0);
        assert_eq!(yuyv[1], 128);
    }
}
