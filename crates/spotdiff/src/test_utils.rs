//! Shared synthetic-image generators for unit tests.
//!
//! Consolidated here so alignment, pipeline, and API tests draw the same
//! corner-rich textures instead of carrying their own near-identical copies.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use rand::prelude::*;

use crate::rect::IntRect;

/// Corner-rich grayscale texture: a grid of randomly shaded blocks.
///
/// Block boundaries give FAST plenty of corners, and the seeded RNG keeps
/// every run identical.
pub(crate) fn textured_gray(w: u32, h: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let block = 16u32;
    let bw = w.div_ceil(block);
    let bh = h.div_ceil(block);
    let shades: Vec<u8> = (0..bw * bh).map(|_| rng.gen_range(20..=235)).collect();

    GrayImage::from_fn(w, h, |x, y| {
        let bx = x / block;
        let by = y / block;
        Luma([shades[(by * bw + bx) as usize]])
    })
}

/// RGBA variant of [`textured_gray`] with per-block colors.
pub(crate) fn textured_rgba(w: u32, h: u32, seed: u64) -> RgbaImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let block = 16u32;
    let bw = w.div_ceil(block);
    let bh = h.div_ceil(block);
    let colors: Vec<[u8; 3]> = (0..bw * bh)
        .map(|_| {
            [
                rng.gen_range(20..=235),
                rng.gen_range(20..=235),
                rng.gen_range(20..=235),
            ]
        })
        .collect();

    RgbaImage::from_fn(w, h, |x, y| {
        let bx = x / block;
        let by = y / block;
        let c = colors[(by * bw + bx) as usize];
        Rgba([c[0], c[1], c[2], 255])
    })
}

/// View of `src` shifted by `(dx, dy)`: output(x, y) = src(x + dx, y + dy),
/// mid-gray outside the source. Content therefore appears moved by
/// `(-dx, -dy)`, and the shifted→original mapping translates by `(dx, dy)`.
pub(crate) fn shifted_gray(src: &GrayImage, dx: i32, dy: i32) -> GrayImage {
    let (w, h) = src.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let sx = x as i32 + dx;
        let sy = y as i32 + dy;
        if sx >= 0 && sy >= 0 && (sx as u32) < w && (sy as u32) < h {
            *src.get_pixel(sx as u32, sy as u32)
        } else {
            Luma([128])
        }
    })
}

/// Paint a solid rectangle into an RGBA image, clamped to its bounds.
pub(crate) fn paint_rect(img: &mut RgbaImage, rect: IntRect, rgba: [u8; 4]) {
    let clamped = rect.clamp_to(img.width(), img.height());
    for y in clamped.top..clamped.bottom() {
        for x in clamped.left..clamped.right() {
            img.put_pixel(x as u32, y as u32, Rgba(rgba));
        }
    }
}
