//! Difference-map computation: structural dissimilarity, saturation-weighted
//! color difference, edge-common suppression, and fusion into one normalized
//! map.

use image::{GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::sampling::{luma, saturation};

/// Dense grid of normalized difference scores in [0, 1], analysis-resolution.
/// Ephemeral: recomputed for every comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl DiffMap {
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; (width * height) as usize],
        }
    }

    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn at(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        self.data[(y * self.width + x) as usize] = value;
    }

    /// Maximum value over the whole map (0 for an empty map).
    pub fn max_value(&self) -> f32 {
        self.data.iter().cloned().fold(0.0f32, f32::max)
    }
}

/// Difference-map stage controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffMapConfig {
    /// Side of the square SSIM window.
    pub ssim_window: u32,
    /// Box-blur radius applied to grayscale inputs before SSIM.
    pub blur_radius: u32,
    /// Strength of shared-edge attenuation on the color term, in [0, 1].
    pub edge_suppression_strength: f32,
    /// Weight of the structural term in the fused map (color gets the rest).
    pub structural_weight: f32,
}

impl Default for DiffMapConfig {
    fn default() -> Self {
        Self {
            ssim_window: 7,
            blur_radius: 1,
            edge_suppression_strength: 0.7,
            structural_weight: 0.5,
        }
    }
}

// SSIM stabilizing constants for 8-bit dynamic range.
const SSIM_C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
const SSIM_C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

/// Windowed structural dissimilarity map: per pixel, (1 − SSIM) / 2 over a
/// local window, clamped to [0, 1]. Inputs are expected to be pre-blurred.
pub fn ssim_map(left: &GrayImage, right: &GrayImage, window: u32) -> DiffMap {
    let (w, h) = left.dimensions();
    debug_assert_eq!(left.dimensions(), right.dimensions());
    let mut out = DiffMap::zeros(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let half = (window / 2) as i32;
    let l = left.as_raw();
    let r = right.as_raw();
    let stride = w as usize;

    for y in 0..h as i32 {
        let y0 = (y - half).max(0);
        let y1 = (y + half).min(h as i32 - 1);
        for x in 0..w as i32 {
            let x0 = (x - half).max(0);
            let x1 = (x + half).min(w as i32 - 1);

            let mut sum_x = 0.0f64;
            let mut sum_y = 0.0f64;
            let mut sum_xx = 0.0f64;
            let mut sum_yy = 0.0f64;
            let mut sum_xy = 0.0f64;
            let mut n = 0.0f64;

            for wy in y0..=y1 {
                let row = wy as usize * stride;
                for wx in x0..=x1 {
                    let a = l[row + wx as usize] as f64;
                    let b = r[row + wx as usize] as f64;
                    sum_x += a;
                    sum_y += b;
                    sum_xx += a * a;
                    sum_yy += b * b;
                    sum_xy += a * b;
                    n += 1.0;
                }
            }

            let mu_x = sum_x / n;
            let mu_y = sum_y / n;
            let sigma_x2 = (sum_xx / n - mu_x * mu_x).max(0.0);
            let sigma_y2 = (sum_yy / n - mu_y * mu_y).max(0.0);
            let sigma_xy = sum_xy / n - mu_x * mu_y;

            let num = (2.0 * mu_x * mu_y + SSIM_C1) * (2.0 * sigma_xy + SSIM_C2);
            let den = (mu_x * mu_x + mu_y * mu_y + SSIM_C1) * (sigma_x2 + sigma_y2 + SSIM_C2);
            let ssim = if den.abs() < 1e-12 { 1.0 } else { num / den };

            let dissim = ((1.0 - ssim) * 0.5).clamp(0.0, 1.0);
            out.set(x as u32, y as u32, dissim as f32);
        }
    }
    out
}

/// Saturation-weighted color difference map.
///
/// Detection sensitivity is raised in saturated (colorful) regions and
/// lowered near gray, where raw RGB noise carries little perceptual meaning.
pub fn color_diff_map(left: &RgbaImage, right: &RgbaImage) -> DiffMap {
    let (w, h) = left.dimensions();
    debug_assert_eq!(left.dimensions(), right.dimensions());
    let mut out = DiffMap::zeros(w, h);

    for (x, y, p1) in left.enumerate_pixels() {
        let p2 = right.get_pixel(x, y);
        let (r1, g1, b1) = (p1[0], p1[1], p1[2]);
        let (r2, g2, b2) = (p2[0], p2[1], p2[2]);

        let sat1 = saturation(r1, g1, b1);
        let sat2 = saturation(r2, g2, b2);
        let sat_avg = (((sat1 + sat2) * 0.5) / 255.0).clamp(0.0, 1.0);
        let chroma_energy = sat_avg.sqrt();
        let w_chroma = 0.18 + 0.82 * chroma_energy;
        let w_sat = 0.18 + 0.62 * chroma_energy;
        let sat_delta = (sat1 - sat2).abs() / 255.0;

        let dr = r1 as f32 - r2 as f32;
        let dg = g1 as f32 - g2 as f32;
        let db = b1 as f32 - b2 as f32;
        let d_rgb = ((dr * dr + dg * dg + db * db) / 3.0).sqrt() / 255.0;

        // Chroma components with luma removed.
        let y1 = luma(r1, g1, b1);
        let y2 = luma(r2, g2, b2);
        let dcr = (r1 as f32 - y1) - (r2 as f32 - y2);
        let dcb = (b1 as f32 - y1) - (b2 as f32 - y2);
        let d_chroma = ((dcr * dcr + dcb * dcb) / 2.0).sqrt() / 255.0;

        let value = d_chroma * w_chroma + d_rgb * 0.22 + sat_delta * w_sat;
        out.set(x, y, value.clamp(0.0, 1.0));
    }
    out
}

/// Per-pixel shared-edge strength: min of the two normalized Scharr gradient
/// magnitudes. Shared high-gradient structure (print lines, outlines)
/// produces spurious raw differences under small misalignment.
pub fn edge_common_map(left: &GrayImage, right: &GrayImage) -> DiffMap {
    let (w, h) = left.dimensions();
    let mut out = DiffMap::zeros(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    let gxl = imageproc::gradients::horizontal_scharr(left);
    let gyl = imageproc::gradients::vertical_scharr(left);
    let gxr = imageproc::gradients::horizontal_scharr(right);
    let gyr = imageproc::gradients::vertical_scharr(right);

    let mut max_mag = 0.0f32;
    let mut mags = vec![0.0f32; (w * h) as usize];
    for (idx, mag) in mags.iter_mut().enumerate() {
        let ml = ((gxl.as_raw()[idx] as f32).powi(2) + (gyl.as_raw()[idx] as f32).powi(2)).sqrt();
        let mr = ((gxr.as_raw()[idx] as f32).powi(2) + (gyr.as_raw()[idx] as f32).powi(2)).sqrt();
        *mag = ml.min(mr);
        max_mag = max_mag.max(ml.max(mr));
    }

    if max_mag > 1e-6 {
        for (idx, &mag) in mags.iter().enumerate() {
            out.data[idx] = mag / max_mag;
        }
    }
    out
}

/// Attenuate `map` where `edge_common` is strong: factor 1 − k·edgeCommon.
pub fn suppress_common_edges(map: &mut DiffMap, edge_common: &DiffMap, strength: f32) {
    debug_assert_eq!(map.data.len(), edge_common.data.len());
    for (v, &e) in map.data.iter_mut().zip(edge_common.data.iter()) {
        *v *= (1.0 - strength * e).clamp(0.0, 1.0);
    }
}

/// Fuse the structural and (suppressed) color terms, then normalize.
pub fn fuse_maps(structural: &DiffMap, color: &DiffMap, structural_weight: f32) -> DiffMap {
    debug_assert_eq!(structural.data.len(), color.data.len());
    let w_s = structural_weight;
    let w_c = 1.0 - structural_weight;
    let data: Vec<f32> = structural
        .data
        .iter()
        .zip(color.data.iter())
        .map(|(&s, &c)| w_s * s + w_c * c)
        .collect();
    normalize_to_unit(DiffMap::from_data(structural.width, structural.height, data))
}

/// Smallest value range that min-max normalization will stretch to full
/// scale. Below it the divisor is held at the floor so resampling noise on
/// near-identical pairs stays proportionally small instead of being
/// amplified to 1.0.
const NORMALIZE_RANGE_FLOOR: f32 = 0.25;

/// Normalization to [0, 1]: shift by the minimum, divide by
/// `max(range, floor)`.
///
/// An (almost) constant map yields all zeros, so identical inputs produce no
/// detections.
pub fn normalize_to_unit(mut map: DiffMap) -> DiffMap {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in &map.data {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() || max - min < 1e-6 {
        map.data.iter_mut().for_each(|v| *v = 0.0);
        return map;
    }
    let inv = 1.0 / (max - min).max(NORMALIZE_RANGE_FLOOR);
    for v in &mut map.data {
        *v = ((*v - min) * inv).clamp(0.0, 1.0);
    }
    map
}
