pub mod morphology;

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, Luma};
use std::path::Path;
use thiserror::Error;

/// Binary mask: 0 = background, 255 = foreground (body or inside-target,
/// depending on context). Dimensions match whatever produced the mask.
pub type Mask = GrayImage;

/// Pixel value marking foreground
pub const FOREGROUND: u8 = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaskError {
    #[error("mask dimensions differ: {0}x{1} vs {2}x{3}")]
    DimensionMismatch(u32, u32, u32, u32),
}

/// All-background mask of the given size
pub fn empty(width: u32, height: u32) -> Mask {
    GrayImage::new(width, height)
}

/// Binarize a decoded image: any non-zero color channel marks the pixel as
/// foreground. This is how the static target silhouette is interpreted.
pub fn binarize(image: &DynamicImage) -> Mask {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let p = rgb.get_pixel(x, y);
        if p[0] > 0 || p[1] > 0 || p[2] > 0 {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

/// Load the target silhouette image and interpret it as a mask.
pub fn load_target<P: AsRef<Path>>(path: P) -> Result<Mask> {
    let image = image::open(path.as_ref())
        .with_context(|| format!("Failed to load target image from {}", path.as_ref().display()))?;
    let mask = binarize(&image);
    tracing::info!(
        "Target mask loaded: {}x{}, {} foreground pixels",
        mask.width(),
        mask.height(),
        foreground_pixels(&mask)
    );
    Ok(mask)
}

/// Pixel-wise logical OR of two masks of equal dimensions.
pub fn union(a: &Mask, b: &Mask) -> std::result::Result<Mask, MaskError> {
    if a.dimensions() != b.dimensions() {
        return Err(MaskError::DimensionMismatch(
            a.width(),
            a.height(),
            b.width(),
            b.height(),
        ));
    }
    let mut out = a.clone();
    for (dst, src) in out.pixels_mut().zip(b.pixels()) {
        if src[0] > 0 {
            *dst = Luma([FOREGROUND]);
        }
    }
    Ok(out)
}

/// Bit-invert a mask (foreground becomes background and vice versa).
pub fn invert(mask: &Mask) -> Mask {
    let mut out = mask.clone();
    for p in out.pixels_mut() {
        *p = Luma([if p[0] > 0 { 0 } else { FOREGROUND }]);
    }
    out
}

/// Number of foreground pixels.
pub fn foreground_pixels(mask: &Mask) -> u64 {
    mask.pixels().filter(|p| p[0] > 0).count() as u64
}

/// Foreground share of the whole mask, in [0, 1]. Empty masks count as 0.
pub fn foreground_fraction(mask: &Mask) -> f32 {
    let total = (mask.width() as u64) * (mask.height() as u64);
    if total == 0 {
        return 0.0;
    }
    foreground_pixels(mask) as f32 / total as f32
}

/// Resize with nearest-neighbor interpolation so the result stays binary.
pub fn resize_nearest(mask: &Mask, width: u32, height: u32) -> Mask {
    if mask.dimensions() == (width, height) {
        return mask.clone();
    }
    image::imageops::resize(mask, width, height, image::imageops::FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn mask_from(rows: &[&[u8]]) -> Mask {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        GrayImage::from_fn(width, height, |x, y| Luma([rows[y as usize][x as usize]]))
    }

    #[test]
    fn test_binarize_any_nonzero_channel() {
        let rgb = image::RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([0, 0, 0]),
            1 => Rgb([0, 1, 0]),
            _ => Rgb([200, 0, 0]),
        });
        let mask = binarize(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(1, 0)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(2, 0)[0], FOREGROUND);
    }

    #[test]
    fn test_union_or_semantics() {
        let a = mask_from(&[&[255, 0, 0]]);
        let b = mask_from(&[&[0, 255, 0]]);
        let c = union(&a, &b).unwrap();
        assert_eq!(c.get_pixel(0, 0)[0], FOREGROUND);
        assert_eq!(c.get_pixel(1, 0)[0], FOREGROUND);
        assert_eq!(c.get_pixel(2, 0)[0], 0);
    }

    #[test]
    fn test_union_rejects_mismatched_dimensions() {
        let a = empty(4, 4);
        let b = empty(5, 4);
        assert_eq!(union(&a, &b), Err(MaskError::DimensionMismatch(4, 4, 5, 4)));
    }

    #[test]
    fn test_invert_roundtrip() {
        let a = mask_from(&[&[255, 0], &[0, 255]]);
        let twice = invert(&invert(&a));
        assert_eq!(a, twice);
        assert_eq!(foreground_pixels(&invert(&a)), 2);
    }

    #[test]
    fn test_foreground_fraction() {
        let a = mask_from(&[&[255, 0], &[0, 0]]);
        assert!((foreground_fraction(&a) - 0.25).abs() < 1e-6);
        assert_eq!(foreground_fraction(&empty(0, 0)), 0.0);
    }

    #[test]
    fn test_resize_nearest_stays_binary() {
        let a = mask_from(&[&[255, 0], &[0, 255]]);
        let big = resize_nearest(&a, 8, 8);
        assert!(big.pixels().all(|p| p[0] == 0 || p[0] == FOREGROUND));
        assert_eq!(big.get_pixel(0, 0)[0], FOREGROUND);
        assert_eq!(big.get_pixel(7, 0)[0], 0);
    }
}
