//! Region detection over the normalized difference map.
//!
//! [`RegionDetector`] is the substitution seam: the built-in
//! [`MapRegionDetector`] implements the full extract/refine pipeline, while
//! test doubles can return fixed boxes without any vision work.

mod extract;
mod map_detector;
mod params;
mod refine;

pub use map_detector::MapRegionDetector;
pub use params::{detection_threshold, DetectorParams};

pub(crate) use extract::{
    component_boxes, enforce_min_area, local_maxima_boxes, min_core_side, tile_fallback_boxes,
};
pub(crate) use refine::refine_candidates;

use serde::{Deserialize, Serialize};

use crate::diffmap::DiffMap;
use crate::rect::IntRect;
use crate::settings::Settings;

/// Which stage produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Thresholded connected component.
    FirstPass,
    /// Supplemental 2-D local maximum merged in the refinement second pass.
    LocalMaxima,
    /// Grid-tile fallback when the standard path found nothing.
    TileFallback,
}

/// A scored candidate region in analysis-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub rect: IntRect,
    pub score: f32,
    pub provenance: Provenance,
}

/// Difference-map-in, boxes-out detection capability.
///
/// The built-in pipeline is one implementation; injected overrides (test
/// doubles, alternative detectors) are others. When an override is supplied
/// the heavy sampling/alignment stages are skipped entirely.
pub trait RegionDetector {
    fn detect_from_diff_map(&self, map: &DiffMap, settings: &Settings) -> Vec<Candidate>;
}
