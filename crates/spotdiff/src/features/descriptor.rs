//! Oriented 256-bit BRIEF descriptors.
//!
//! The sampling-pair pattern is drawn once from a seeded RNG (BRIEF's
//! random-pair construction) and rotated per keypoint by the keypoint's
//! orientation, giving in-plane rotation tolerance.

use image::GrayImage;
use rand::prelude::*;

use super::detect::Keypoint;
use super::FeatureConfig;

/// Descriptor length in bytes (256 intensity comparisons).
pub const DESCRIPTOR_BYTES: usize = 32;

/// Fixed-length binary descriptor bound to one keypoint.
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// Half-extent of the sampling patch.
const PATCH_RADIUS: i32 = 13;

/// BRIEF extractor with a fixed, seed-derived sampling pattern.
#[derive(Debug, Clone)]
pub struct BriefExtractor {
    pattern: Vec<(i8, i8, i8, i8)>,
}

impl BriefExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.pattern_seed);
        let r = PATCH_RADIUS as i8;
        let pattern = (0..DESCRIPTOR_BYTES * 8)
            .map(|_| {
                (
                    rng.gen_range(-r..=r),
                    rng.gen_range(-r..=r),
                    rng.gen_range(-r..=r),
                    rng.gen_range(-r..=r),
                )
            })
            .collect();
        Self { pattern }
    }

    /// Describe one keypoint. Sample points are rotated by the keypoint
    /// orientation and clamped to the image bounds.
    pub fn describe(&self, image: &GrayImage, keypoint: &Keypoint) -> Descriptor {
        let mut descriptor = [0u8; DESCRIPTOR_BYTES];
        let x = keypoint.x as i32;
        let y = keypoint.y as i32;
        let (sin, cos) = keypoint.angle.sin_cos();

        let max_x = image.width() as i32 - 1;
        let max_y = image.height() as i32 - 1;

        for (byte_idx, byte_tests) in self.pattern.chunks(8).enumerate() {
            let mut byte_val = 0u8;
            for (bit_idx, &(dx1, dy1, dx2, dy2)) in byte_tests.iter().enumerate() {
                let rx1 = (dx1 as f32 * cos - dy1 as f32 * sin) as i32;
                let ry1 = (dx1 as f32 * sin + dy1 as f32 * cos) as i32;
                let rx2 = (dx2 as f32 * cos - dy2 as f32 * sin) as i32;
                let ry2 = (dx2 as f32 * sin + dy2 as f32 * cos) as i32;

                let p1x = (x + rx1).clamp(0, max_x) as u32;
                let p1y = (y + ry1).clamp(0, max_y) as u32;
                let p2x = (x + rx2).clamp(0, max_x) as u32;
                let p2y = (y + ry2).clamp(0, max_y) as u32;

                if image.get_pixel(p1x, p1y)[0] < image.get_pixel(p2x, p2y)[0] {
                    byte_val |= 1 << bit_idx;
                }
            }
            descriptor[byte_idx] = byte_val;
        }

        descriptor
    }

    /// Describe every keypoint in order.
    pub fn describe_all(&self, image: &GrayImage, keypoints: &[Keypoint]) -> Vec<Descriptor> {
        keypoints.iter().map(|kp| self.describe(image, kp)).collect()
    }
}
