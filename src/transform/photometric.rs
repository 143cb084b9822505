//! Photometric adjustments. These never move pixels.

use image::RgbaImage;

/// Scales the color channels of every pixel by `factor`.
///
/// `0.0` yields black, `1.0` leaves the image unchanged. Results are rounded
/// and clamped to `0..=255`; alpha is untouched.
pub(crate) fn scale_brightness(image: &mut RgbaImage, factor: f64) {
    if factor == 1.0 {
        return;
    }
    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut().take(3) {
            *channel = (*channel as f64 * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn darkens_and_keeps_alpha() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([100, 200, 50, 128]));
        scale_brightness(&mut img, 0.8);
        assert_eq!(*img.get_pixel(1, 1), Rgba([80, 160, 40, 128]));
    }

    #[test]
    fn brightening_clamps() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([100, 200, 250, 255]));
        scale_brightness(&mut img, 1.5);
        assert_eq!(*img.get_pixel(0, 0), Rgba([150, 255, 255, 255]));
    }

    #[test]
    fn unit_factor_is_noop() {
        let original = RgbaImage::from_pixel(3, 1, Rgba([1, 2, 3, 4]));
        let mut img = original.clone();
        scale_brightness(&mut img, 1.0);
        assert_eq!(img, original);
    }
}
