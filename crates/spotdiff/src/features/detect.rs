//! FAST-style corner detection with grid non-max suppression.

use std::cmp::Ordering;
use std::collections::HashSet;

use image::GrayImage;

use super::FeatureConfig;

/// A detected corner with response strength and dominant orientation.
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub response: f32,
    /// Orientation (radians) from the intensity centroid around the corner.
    pub angle: f32,
}

/// Bresenham circle of radius 3 used by the segment test.
const CIRCLE_OFFSETS: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Quick rejection using the 4 cardinal circle points: a corner needs at
/// least 3 of them consistently brighter or darker than the center.
fn fast_pre_check(image: &GrayImage, x: u32, y: u32, center: u8, threshold: u8) -> bool {
    let bright = center.saturating_add(threshold);
    let dark = center.saturating_sub(threshold);

    let pixels = [
        image.get_pixel(x, y - 3)[0],
        image.get_pixel(x + 3, y)[0],
        image.get_pixel(x, y + 3)[0],
        image.get_pixel(x - 3, y)[0],
    ];

    let bright_count = pixels.iter().filter(|&&p| p > bright).count();
    let dark_count = pixels.iter().filter(|&&p| p < dark).count();
    bright_count >= 3 || dark_count >= 3
}

/// Full segment test: 9 contiguous circle pixels all brighter or all darker
/// than the center (wraparound handled by scanning the ring twice).
fn is_fast_corner(image: &GrayImage, x: u32, y: u32, center: u8, threshold: u8) -> bool {
    let bright = center.saturating_add(threshold);
    let dark = center.saturating_sub(threshold);

    let mut max_bright_run = 0;
    let mut max_dark_run = 0;
    let mut bright_run = 0;
    let mut dark_run = 0;

    for i in 0..(CIRCLE_OFFSETS.len() * 2) {
        let (dx, dy) = CIRCLE_OFFSETS[i % CIRCLE_OFFSETS.len()];
        let px = (x as i32 + dx) as u32;
        let py = (y as i32 + dy) as u32;
        let pixel = image.get_pixel(px, py)[0];

        if pixel > bright {
            bright_run += 1;
            dark_run = 0;
            max_bright_run = max_bright_run.max(bright_run);
        } else if pixel < dark {
            dark_run += 1;
            bright_run = 0;
            max_dark_run = max_dark_run.max(dark_run);
        } else {
            bright_run = 0;
            dark_run = 0;
        }
    }

    max_bright_run >= 9 || max_dark_run >= 9
}

/// Corner response: local intensity standard deviation over a 5×5 patch.
fn corner_response(image: &GrayImage, x: u32, y: u32) -> f32 {
    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    let mut count = 0u32;

    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            let px = x as i32 + dx;
            let py = y as i32 + dy;
            if px >= 0 && py >= 0 && (px as u32) < image.width() && (py as u32) < image.height() {
                let v = image.get_pixel(px as u32, py as u32)[0] as f32;
                sum += v;
                sum_sq += v * v;
                count += 1;
            }
        }
    }

    let mean = sum / count as f32;
    ((sum_sq / count as f32) - mean * mean).max(0.0).sqrt()
}

/// Orientation from the intensity centroid in a disc around the corner.
fn keypoint_orientation(image: &GrayImage, x: u32, y: u32) -> f32 {
    let radius: i32 = 7;
    let mut m01 = 0.0f32;
    let mut m10 = 0.0f32;

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let px = x as i32 + dx;
            let py = y as i32 + dy;
            if px >= 0 && py >= 0 && (px as u32) < image.width() && (py as u32) < image.height() {
                let v = image.get_pixel(px as u32, py as u32)[0] as f32;
                m01 += v * dy as f32;
                m10 += v * dx as f32;
            }
        }
    }

    m01.atan2(m10)
}

/// Grid-based non-max suppression: one keypoint per occupied grid cell
/// neighborhood, strongest responses first, capped at `max_keypoints`.
fn grid_nms(mut keypoints: Vec<Keypoint>, cell: f32, max_keypoints: usize) -> Vec<Keypoint> {
    if keypoints.is_empty() {
        return keypoints;
    }
    keypoints.sort_by(|a, b| b.response.partial_cmp(&a.response).unwrap_or(Ordering::Equal));

    let mut occupied = HashSet::new();
    let mut selected = Vec::new();
    for kp in keypoints {
        let gx = (kp.x / cell) as i32;
        let gy = (kp.y / cell) as i32;

        let mut is_max = true;
        'scan: for dy in -1..=1 {
            for dx in -1..=1 {
                if occupied.contains(&(gx + dx, gy + dy)) {
                    is_max = false;
                    break 'scan;
                }
            }
        }

        if is_max {
            occupied.insert((gx, gy));
            selected.push(kp);
            if selected.len() >= max_keypoints {
                break;
            }
        }
    }
    selected
}

/// Detect FAST corners with responses and orientations.
pub fn detect_keypoints(image: &GrayImage, config: &FeatureConfig) -> Vec<Keypoint> {
    let (width, height) = image.dimensions();
    if width < 8 || height < 8 {
        return Vec::new();
    }

    let mut corners = Vec::new();
    for y in 3..(height - 3) {
        for x in 3..(width - 3) {
            let center = image.get_pixel(x, y)[0];
            if !fast_pre_check(image, x, y, center, config.fast_threshold) {
                continue;
            }
            if !is_fast_corner(image, x, y, center, config.fast_threshold) {
                continue;
            }
            corners.push(Keypoint {
                x: x as f32,
                y: y as f32,
                response: corner_response(image, x, y),
                angle: keypoint_orientation(image, x, y),
            });
        }
    }

    grid_nms(corners, config.grid_nms_radius, config.max_keypoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn image_with_square(w: u32, h: u32, left: u32, top: u32, side: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(w, h, Luma([30]));
        for y in top..(top + side) {
            for x in left..(left + side) {
                img.put_pixel(x, y, Luma([220]));
            }
        }
        img
    }

    #[test]
    fn square_corners_are_detected() {
        let img = image_with_square(64, 64, 20, 20, 16);
        let kps = detect_keypoints(&img, &FeatureConfig::default());
        assert!(!kps.is_empty());

        // At least one keypoint near each true corner of the square.
        for corner in [[20.0f32, 20.0], [35.0, 20.0], [20.0, 35.0], [35.0, 35.0]] {
            let hit = kps.iter().any(|kp| {
                let dx = kp.x - corner[0];
                let dy = kp.y - corner[1];
                (dx * dx + dy * dy).sqrt() < 4.0
            });
            assert!(hit, "no keypoint near corner {:?}", corner);
        }
    }

    #[test]
    fn flat_image_has_no_keypoints() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        assert!(detect_keypoints(&img, &FeatureConfig::default()).is_empty());
    }

    #[test]
    fn keypoint_cap_is_honored() {
        let mut img = GrayImage::from_pixel(128, 128, Luma([20]));
        // Dense grid of bright squares produces many corners.
        for by in (8..120).step_by(12) {
            for bx in (8..120).step_by(12) {
                for y in by..(by + 6) {
                    for x in bx..(bx + 6) {
                        img.put_pixel(x, y, Luma([230]));
                    }
                }
            }
        }
        let config = FeatureConfig {
            max_keypoints: 16,
            ..FeatureConfig::default()
        };
        let kps = detect_keypoints(&img, &config);
        assert!(kps.len() <= 16);
        assert!(!kps.is_empty());
    }

    #[test]
    fn tiny_images_yield_nothing() {
        let img = GrayImage::new(6, 6);
        assert!(detect_keypoints(&img, &FeatureConfig::default()).is_empty());
    }
}
