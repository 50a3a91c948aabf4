use super::Mask;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, dilate, erode};

/// Effective LInf radius for a square kernel applied over several iterations.
/// A kernel of edge k grows a region by k/2 pixels per iteration.
fn radius(kernel: u32, iterations: u32) -> u8 {
    ((kernel / 2) * iterations).min(u8::MAX as u32) as u8
}

/// Estimator smoothing pass: dilate to merge speckle, then close to fill
/// internal gaps. Not idempotent; applied once per frame.
pub fn smooth(mask: &Mask, kernel: u32, dilate_iters: u32, close_iters: u32) -> Mask {
    let mut out = mask.clone();
    let d = radius(kernel, dilate_iters);
    if d > 0 {
        out = dilate(&out, Norm::LInf, d);
    }
    let c = radius(kernel, close_iters);
    if c > 0 {
        out = close(&out, Norm::LInf, c);
    }
    out
}

/// Scoring pass: a heavier dilation to bridge segmentation holes, then an
/// erosion to pull back over-dilated boundaries.
pub fn expand_and_trim(mask: &Mask, kernel: u32, dilate_iters: u32, erode_iters: u32) -> Mask {
    let mut out = mask.clone();
    let d = radius(kernel, dilate_iters);
    if d > 0 {
        out = dilate(&out, Norm::LInf, d);
    }
    let e = radius(kernel, erode_iters);
    if e > 0 {
        out = erode(&out, Norm::LInf, e);
    }
    out
}
