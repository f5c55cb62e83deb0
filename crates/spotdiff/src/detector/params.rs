//! Detector-stage parameters and the precision-level threshold schedule.

use serde::{Deserialize, Serialize};

/// Region extraction, scoring, and refinement controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// IoU above which the lower-scoring of two candidates is suppressed.
    pub nms_iou_threshold: f64,
    /// Hard cap on returned candidates.
    pub max_results: usize,
    /// Tiles per axis for the zero-candidate fallback grid.
    pub tile_grid: u32,
    /// Fallback candidates emitted from the tile grid, best first.
    pub tile_top_k: usize,
    /// Upper clamp on the minimum core side derived from the area floor.
    pub min_core_side_limit: i32,
    /// Symmetric padding added to every extracted box.
    pub box_pad: i32,
    /// Minimum Chebyshev distance between supplemental local maxima.
    pub local_maxima_min_distance: u32,
    /// Fraction of lowest in-box values averaged by tail-mean rescoring.
    pub tail_fraction: f32,
    /// Minimum tile peak for the fallback to treat the map as carrying
    /// signal; resampling noise on near-identical pairs stays below it.
    pub tile_min_score: f32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            nms_iou_threshold: 0.3,
            max_results: 10,
            tile_grid: 20,
            tile_top_k: 10,
            min_core_side_limit: 64,
            box_pad: 3,
            local_maxima_min_distance: 8,
            tail_fraction: 0.25,
            tile_min_score: 0.15,
        }
    }
}

/// Detection threshold for a precision level: `clamp(0.9 − (p−1)·0.05, 0.6, 0.9)`.
///
/// Higher precision levels are more permissive: the threshold is
/// non-increasing in `p`, so the candidate count before suppression is
/// non-decreasing.
pub fn detection_threshold(precision_level: u8) -> f32 {
    let p = precision_level as f32;
    (0.9 - (p - 1.0) * 0.05).clamp(0.6, 0.9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_schedule_is_non_increasing() {
        let mut prev = f32::INFINITY;
        for p in 1..=7u8 {
            let t = detection_threshold(p);
            assert!(t <= prev, "t({}) = {} rose above {}", p, t, prev);
            assert!((0.6..=0.9).contains(&t));
            prev = t;
        }
    }

    #[test]
    fn threshold_endpoints() {
        assert!((detection_threshold(1) - 0.9).abs() < 1e-6);
        assert!((detection_threshold(7) - 0.6).abs() < 1e-6);
    }
}
