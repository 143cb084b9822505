//! Inverse-mapped affine warping with bilinear sampling.
//!
//! For each output pixel the center `(x + 0.5, y + 0.5)` is pulled back
//! through the inverse of the forward point map, and the source is sampled
//! there. Sampling and point mapping therefore share one matrix: a vertex at
//! `p` in the source lands on the output pixel that sampled from `p`.
//!
//! Output pixels whose pre-image falls outside the source are transparent
//! black.

use image::{Rgba, RgbaImage};

use super::Geometry;
use crate::ir::Point;

const FILL: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Warps `src` into a new canvas of `geometry.width × geometry.height`.
pub(crate) fn warp_rgba(src: &RgbaImage, geometry: &Geometry) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(geometry.width, geometry.height, FILL);
    let Some(inverse) = geometry.affine.inverse() else {
        return out;
    };

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let at = inverse.apply(Point::new(x as f64 + 0.5, y as f64 + 0.5));
        *pixel = sample_bilinear(src, at.x, at.y);
    }
    out
}

/// Samples `src` at continuous pixel-space coordinates (pixel `i` covers
/// `[i, i + 1)`).
fn sample_bilinear(src: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (w, h) = (src.width(), src.height());
    if w == 0 || h == 0 {
        return FILL;
    }
    if !(x >= 0.0 && x <= w as f64 && y >= 0.0 && y <= h as f64) {
        return FILL;
    }

    // Shift to pixel-center space and clamp so edge pixels extend to the
    // canvas border.
    let fx = (x - 0.5).clamp(0.0, (w - 1) as f64);
    let fy = (y - 0.5).clamp(0.0, (h - 1) as f64);

    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - x0 as f64;
    let ty = fy - y0 as f64;

    let p00 = src.get_pixel(x0, y0).0;
    let p10 = src.get_pixel(x1, y0).0;
    let p01 = src.get_pixel(x0, y1).0;
    let p11 = src.get_pixel(x1, y1).0;

    let mut result = [0u8; 4];
    for i in 0..4 {
        let v = p00[i] as f64 * (1.0 - tx) * (1.0 - ty)
            + p10[i] as f64 * tx * (1.0 - ty)
            + p01[i] as f64 * (1.0 - tx) * ty
            + p11[i] as f64 * tx * ty;
        result[i] = v.round().clamp(0.0, 255.0) as u8;
    }
    Rgba(result)
}
