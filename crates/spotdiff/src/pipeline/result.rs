//! Comparison result types.

use serde::{Deserialize, Serialize};

use crate::detector::Provenance;
use crate::diffmap::DiffMap;
use crate::rect::IntRect;
use crate::remap::{scale_rect_between_spaces, SpaceMap};

/// A detected difference region in full-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredBox {
    pub rect: IntRect,
    pub score: f32,
    pub provenance: Provenance,
}

/// How the alignment stage concluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Accumulated right→left homography (row-major), identity when degraded.
    pub homography: [[f64; 3]; 3],
    /// Passes that produced an accepted estimate.
    pub passes_used: usize,
    /// True when no estimate was accepted and identity is in effect.
    pub degraded: bool,
}

impl Default for AlignmentReport {
    fn default() -> Self {
        Self {
            homography: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            passes_used: 0,
            degraded: true,
        }
    }
}

/// Terminal artifact of one comparison.
///
/// Boxes are ordered by refined score (ties: larger area first) and expressed
/// in the LEFT image's full-resolution pixel space. The analysis-resolution
/// difference map is included so overlays can scale consistently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareOutcome {
    /// Final difference regions, full-image (left) pixel coordinates.
    pub boxes: Vec<ScoredBox>,
    /// Normalized analysis-resolution difference map.
    pub diff_map: DiffMap,
    /// Analysis dimensions [width, height] the map and overlay share.
    pub analysis_size: [u32; 2],
    /// Alignment summary.
    pub alignment: AlignmentReport,
    /// Left crop region in full-image pixels (analysis source).
    pub left_crop: IntRect,
    /// Right crop region in full-image pixels.
    pub right_crop: IntRect,
}

impl CompareOutcome {
    /// An empty result for degenerate inputs.
    pub fn empty(analysis_w: u32, analysis_h: u32) -> Self {
        Self {
            boxes: Vec::new(),
            diff_map: DiffMap::zeros(analysis_w, analysis_h),
            analysis_size: [analysis_w, analysis_h],
            alignment: AlignmentReport::default(),
            left_crop: IntRect::new(0, 0, 0, 0),
            right_crop: IntRect::new(0, 0, 0, 0),
        }
    }

    /// Reproject a result box from the left view into the right view's
    /// full-image pixel space, honoring both independent crops.
    pub fn reproject_to_right(&self, rect: IntRect) -> IntRect {
        let in_left_crop = IntRect::new(
            rect.left - self.left_crop.left,
            rect.top - self.left_crop.top,
            rect.width,
            rect.height,
        );
        let in_right_crop = scale_rect_between_spaces(
            in_left_crop,
            self.left_crop.width.max(0) as u32,
            self.left_crop.height.max(0) as u32,
            self.right_crop.width.max(0) as u32,
            self.right_crop.height.max(0) as u32,
        );
        IntRect::new(
            in_right_crop.left + self.right_crop.left,
            in_right_crop.top + self.right_crop.top,
            in_right_crop.width,
            in_right_crop.height,
        )
    }

    /// Space map from analysis coordinates to the left full image.
    pub(crate) fn left_space(&self) -> SpaceMap {
        SpaceMap::new(self.left_crop, self.analysis_size[0], self.analysis_size[1])
    }
}
