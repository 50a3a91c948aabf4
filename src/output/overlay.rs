use crate::mask::{self, Mask};
use image::{Rgb, RgbImage};

const COVERED: Rgb<u8> = Rgb([0, 220, 60]);
const EXCESS: Rgb<u8> = Rgb([230, 40, 40]);
const REMAINING: Rgb<u8> = Rgb([255, 255, 255]);

fn blend(base: Rgb<u8>, tint: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let mix = |b: u8, t: u8| (b as f32 * (1.0 - alpha) + t as f32 * alpha) as u8;
    Rgb([
        mix(base[0], tint[0]),
        mix(base[1], tint[1]),
        mix(base[2], tint[2]),
    ])
}

/// Composite the score view onto a frame: body pixels inside the target are
/// tinted green, body pixels outside it red, and the uncovered remainder of
/// the silhouette is lightened so the player can see what is left to fill.
pub fn compose_view(frame: &RgbImage, body: &Mask, target: &Mask) -> RgbImage {
    let (width, height) = frame.dimensions();
    let body = mask::resize_nearest(body, width, height);
    let target = mask::resize_nearest(target, width, height);

    let mut out = frame.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let in_body = body.get_pixel(x, y)[0] > 0;
        let in_target = target.get_pixel(x, y)[0] > 0;
        *pixel = match (in_body, in_target) {
            (true, true) => blend(*pixel, COVERED, 0.5),
            (true, false) => blend(*pixel, EXCESS, 0.5),
            (false, true) => blend(*pixel, REMAINING, 0.25),
            (false, false) => *pixel,
        };
    }
    out
}

/// Render a mask as a grayscale image (white silhouette on black), for the
/// debug view.
pub fn mask_view(mask: &Mask) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let v = mask.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}
