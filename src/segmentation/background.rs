use crate::config::BackgroundConfig;
use crate::mask::{self, Mask, FOREGROUND};
use image::{imageops, GrayImage, Luma, RgbImage};

/// Running estimate of the static scene, accumulated over grayscale,
/// blurred frames with an exponential moving average.
///
/// For the first `warmup_frames` calls the model only seeds itself and
/// reports an all-background mask. Afterwards each frame is differenced
/// against the estimate, and the estimate keeps adapting slowly so lighting
/// drift does not turn into phantom foreground.
pub struct BackgroundModel {
    config: BackgroundConfig,
    accum: Vec<f32>,
    width: u32,
    height: u32,
    frames_seen: u32,
}

impl BackgroundModel {
    pub fn new(config: BackgroundConfig) -> Self {
        Self {
            config,
            accum: Vec::new(),
            width: 0,
            height: 0,
            frames_seen: 0,
        }
    }

    pub fn is_warming(&self) -> bool {
        self.frames_seen < self.config.warmup_frames
    }

    pub fn reset(&mut self) {
        self.accum.clear();
        self.width = 0;
        self.height = 0;
        self.frames_seen = 0;
    }

    /// Process one frame. During warm-up (and on the seeding frame) the
    /// result is all-background; afterwards it marks pixels that differ from
    /// the scene estimate by more than the configured threshold.
    pub fn apply(&mut self, frame: &RgbImage) -> Mask {
        let gray = self.prepare(frame);
        let (width, height) = gray.dimensions();

        if (width, height) != (self.width, self.height) {
            if !self.accum.is_empty() {
                tracing::warn!(
                    "Frame size changed to {}x{}, reseeding background model",
                    width,
                    height
                );
            }
            self.reset();
            self.width = width;
            self.height = height;
            self.accum = gray.pixels().map(|p| p[0] as f32).collect();
            self.frames_seen = 1;
            return mask::empty(width, height);
        }

        if self.is_warming() {
            self.accumulate(&gray, self.config.seed_alpha);
            self.frames_seen += 1;
            return mask::empty(width, height);
        }

        let moving = self.threshold_difference(&gray);
        self.accumulate(&gray, self.config.adapt_alpha);
        moving
    }

    fn prepare(&self, frame: &RgbImage) -> GrayImage {
        let gray = imageops::grayscale(frame);
        if self.config.blur_sigma > 0.0 {
            imageops::blur(&gray, self.config.blur_sigma)
        } else {
            gray
        }
    }

    fn accumulate(&mut self, gray: &GrayImage, alpha: f32) {
        for (acc, p) in self.accum.iter_mut().zip(gray.pixels()) {
            *acc = alpha * p[0] as f32 + (1.0 - alpha) * *acc;
        }
    }

    fn threshold_difference(&self, gray: &GrayImage) -> Mask {
        let threshold = self.config.diff_threshold as f32;
        let mut out = mask::empty(self.width, self.height);
        for ((p, acc), dst) in gray.pixels().zip(self.accum.iter()).zip(out.pixels_mut()) {
            if (p[0] as f32 - acc).abs() > threshold {
                *dst = Luma([FOREGROUND]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BackgroundConfig {
        BackgroundConfig {
            warmup_frames: 10,
            seed_alpha: 0.5,
            adapt_alpha: 0.5,
            diff_threshold: 15,
            blur_sigma: 0.0,
        }
    }

    fn solid_frame(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb([value, value, value]))
    }

    #[test]
    fn test_warmup_is_all_background_regardless_of_content() {
        let mut bg = BackgroundModel::new(test_config());
        for i in 0..10 {
            // Alternate wildly different frames during warm-up
            let frame = solid_frame(8, 8, if i % 2 == 0 { 0 } else { 255 });
            let m = bg.apply(&frame);
            assert_eq!(mask::foreground_pixels(&m), 0, "warm-up call {}", i);
        }
        assert!(!bg.is_warming());
    }

    #[test]
    fn test_static_scene_yields_empty_mask() {
        let mut bg = BackgroundModel::new(test_config());
        let frame = solid_frame(8, 8, 100);
        for _ in 0..10 {
            bg.apply(&frame);
        }
        let m = bg.apply(&frame);
        assert_eq!(mask::foreground_pixels(&m), 0);
    }

    #[test]
    fn test_bright_intruder_is_detected() {
        let mut bg = BackgroundModel::new(test_config());
        let background = solid_frame(8, 8, 20);
        for _ in 0..10 {
            bg.apply(&background);
        }

        let mut intruded = background.clone();
        for y in 2..6 {
            for x in 2..6 {
                intruded.put_pixel(x, y, image::Rgb([250, 250, 250]));
            }
        }
        let m = bg.apply(&intruded);
        assert_eq!(mask::foreground_pixels(&m), 16);
        assert_eq!(m.get_pixel(3, 3)[0], FOREGROUND);
        assert_eq!(m.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_model_adapts_to_new_static_scene() {
        let mut bg = BackgroundModel::new(test_config());
        let dark = solid_frame(4, 4, 0);
        for _ in 0..10 {
            bg.apply(&dark);
        }

        // A persistent scene change is absorbed by the slow accumulation
        let bright = solid_frame(4, 4, 255);
        let mut absorbed = false;
        for _ in 0..10 {
            if mask::foreground_pixels(&bg.apply(&bright)) == 0 {
                absorbed = true;
                break;
            }
        }
        assert!(absorbed, "background never adapted to the new scene");
    }

    #[test]
    fn test_resolution_change_reseeds() {
        let mut bg = BackgroundModel::new(test_config());
        for _ in 0..12 {
            bg.apply(&solid_frame(8, 8, 100));
        }
        assert!(!bg.is_warming());

        let m = bg.apply(&solid_frame(4, 4, 100));
        assert_eq!(m.dimensions(), (4, 4));
        assert_eq!(mask::foreground_pixels(&m), 0);
        assert!(bg.is_warming());
    }
}
