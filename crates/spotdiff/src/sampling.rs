//! Image sampling and normalization: crop extraction, bilinear resize,
//! grayscale conversion, box blur.
//!
//! All transforms are pure; degenerate inputs (empty image, zero-area crop)
//! are reported as `None` and turned into an empty comparison result by the
//! pipeline, never into an error.

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbaImage};

use crate::rect::Rect;

/// Fixed luma weights applied during grayscale conversion.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Extract the normalized crop region from a source image.
///
/// `None` when the source is empty or the crop has zero pixel area.
pub fn extract_rgba_region(src: &RgbaImage, crop: Rect) -> Option<RgbaImage> {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 || crop.is_degenerate() {
        return None;
    }
    let px = crop.to_pixels(w, h);
    if px.is_empty() {
        return None;
    }
    Some(
        imageops::crop_imm(
            src,
            px.left as u32,
            px.top as u32,
            px.width as u32,
            px.height as u32,
        )
        .to_image(),
    )
}

/// Bilinear resize to exact target dimensions.
pub fn resize_rgba_bilinear(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    imageops::resize(src, width, height, FilterType::Triangle)
}

/// Bilinear resize of a grayscale buffer.
pub fn resize_gray_bilinear(src: &GrayImage, width: u32, height: u32) -> GrayImage {
    imageops::resize(src, width, height, FilterType::Triangle)
}

/// Grayscale conversion with fixed luma weighting.
pub fn gray_from_rgba(src: &RgbaImage) -> GrayImage {
    let (w, h) = src.dimensions();
    let mut out = GrayImage::new(w, h);
    for (x, y, p) in src.enumerate_pixels() {
        let luma = LUMA_R * p[0] as f32 + LUMA_G * p[1] as f32 + LUMA_B * p[2] as f32;
        out.put_pixel(x, y, image::Luma([luma.round().clamp(0.0, 255.0) as u8]));
    }
    out
}

/// Box blur with a small fixed radius, applied to grayscale buffers before
/// structural-similarity computation to suppress sub-pixel jitter noise.
pub fn box_blur_gray(src: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 || src.width() == 0 || src.height() == 0 {
        return src.clone();
    }
    imageproc::filter::box_filter(src, radius, radius)
}

/// Saturation of an RGB triplet: max − min channel, in 0..255.
pub(crate) fn saturation(r: u8, g: u8, b: u8) -> f32 {
    let max = r.max(g).max(b) as f32;
    let min = r.min(g).min(b) as f32;
    max - min
}

/// Luma of an RGB triplet with the fixed conversion weights.
pub(crate) fn luma(r: u8, g: u8, b: u8) -> f32 {
    LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(rgba))
    }

    #[test]
    fn extract_defaults_to_whole_image() {
        let src = solid(64, 48, [10, 20, 30, 255]);
        let out = extract_rgba_region(&src, Rect::FULL).unwrap();
        assert_eq!(out.dimensions(), (64, 48));
    }

    #[test]
    fn extract_honors_normalized_crop() {
        let mut src = solid(100, 100, [0, 0, 0, 255]);
        src.put_pixel(60, 60, Rgba([255, 0, 0, 255]));

        let out = extract_rgba_region(&src, Rect::new(0.5, 0.5, 0.25, 0.25)).unwrap();
        assert_eq!(out.dimensions(), (25, 25));
        assert_eq!(out.get_pixel(10, 10)[0], 255);
    }

    #[test]
    fn extract_rejects_degenerate_inputs() {
        let src = solid(32, 32, [0, 0, 0, 255]);
        assert!(extract_rgba_region(&src, Rect::new(0.2, 0.2, 0.0, 0.5)).is_none());
        let empty = RgbaImage::new(0, 0);
        assert!(extract_rgba_region(&empty, Rect::FULL).is_none());
    }

    #[test]
    fn gray_conversion_uses_fixed_luma_weights() {
        let src = solid(2, 2, [255, 0, 0, 255]);
        let gray = gray_from_rgba(&src);
        assert_eq!(gray.get_pixel(0, 0)[0], 76); // round(0.299 * 255)
    }

    #[test]
    fn resize_preserves_solid_color() {
        let src = solid(40, 40, [100, 150, 200, 255]);
        let out = resize_rgba_bilinear(&src, 16, 16);
        assert_eq!(out.dimensions(), (16, 16));
        let p = out.get_pixel(8, 8);
        assert_eq!([p[0], p[1], p[2]], [100, 150, 200]);
    }

    #[test]
    fn blur_flattens_isolated_noise() {
        let mut src = GrayImage::new(9, 9);
        src.put_pixel(4, 4, image::Luma([255]));
        let out = box_blur_gray(&src, 1);
        assert!(out.get_pixel(4, 4)[0] < 50);
    }

    #[test]
    fn saturation_of_gray_is_zero() {
        assert_eq!(saturation(90, 90, 90), 0.0);
        assert_eq!(saturation(255, 0, 0), 255.0);
    }
}
