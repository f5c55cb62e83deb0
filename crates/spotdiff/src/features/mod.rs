//! Keypoint detection, binary descriptors, and descriptor matching.
//!
//! The alignment stage consumes these primitives: FAST-style corner
//! detection with grid non-max suppression, oriented 256-bit BRIEF
//! descriptors, and Hamming-distance matching with a ratio test
//! cross-checked in both directions.

mod descriptor;
mod detect;
mod matching;

pub use descriptor::{BriefExtractor, Descriptor, DESCRIPTOR_BYTES};
pub use detect::{detect_keypoints, Keypoint};
pub use matching::{match_descriptors_ratio_cross, FeatureMatch};

/// Keypoint/descriptor extraction controls.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeatureConfig {
    /// FAST segment-test intensity threshold.
    pub fast_threshold: u8,
    /// Cap on keypoints retained per image, strongest responses first.
    pub max_keypoints: usize,
    /// Grid cell size (pixels) for detection non-max suppression.
    pub grid_nms_radius: f32,
    /// Seed for the BRIEF sampling-pair pattern.
    pub pattern_seed: u64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            max_keypoints: 500,
            grid_nms_radius: 5.0,
            pattern_seed: 17,
        }
    }
}
