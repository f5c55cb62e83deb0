//! Built-in difference-map region detector.

use super::{
    component_boxes, detection_threshold, enforce_min_area, local_maxima_boxes, min_core_side,
    refine_candidates, tile_fallback_boxes, Candidate, DetectorParams, RegionDetector,
};
use crate::diffmap::DiffMap;
use crate::settings::Settings;

/// The full extract/refine pipeline behind the [`RegionDetector`] seam.
#[derive(Debug, Clone, Default)]
pub struct MapRegionDetector {
    params: DetectorParams,
}

impl MapRegionDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }
}

impl RegionDetector for MapRegionDetector {
    fn detect_from_diff_map(&self, map: &DiffMap, settings: &Settings) -> Vec<Candidate> {
        let params = &self.params;
        let threshold = detection_threshold(settings.precision_level());

        let mut first_pass = component_boxes(map, threshold);
        let mut supplemental =
            local_maxima_boxes(map, threshold, params.local_maxima_min_distance);

        if first_pass.is_empty() && supplemental.is_empty() {
            let tiles = tile_fallback_boxes(map, params);
            tracing::debug!(
                n_tiles = tiles.len(),
                threshold,
                "no standard candidates; tile fallback"
            );
            return tiles;
        }

        let side = min_core_side(
            settings.min_area_percent(),
            map.width,
            map.height,
            params.min_core_side_limit,
        );
        enforce_min_area(&mut first_pass, params, side, map.width, map.height);
        enforce_min_area(&mut supplemental, params, side, map.width, map.height);

        let refined = refine_candidates(map, first_pass, supplemental, params);
        tracing::debug!(n_candidates = refined.len(), threshold, "detection complete");
        refined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rect::IntRect;

    fn map_with_blob(w: u32, h: u32, blob: IntRect, value: f32) -> DiffMap {
        let mut map = DiffMap::zeros(w, h);
        for y in blob.top..blob.bottom() {
            for x in blob.left..blob.right() {
                map.set(x as u32, y as u32, value);
            }
        }
        map
    }

    #[test]
    fn strong_blob_is_detected_and_meets_the_area_floor() {
        let map = map_with_blob(256, 256, IntRect::new(100, 100, 3, 3), 0.95);
        let detector = MapRegionDetector::default();
        let settings = Settings::default();
        let out = detector.detect_from_diff_map(&map, &settings);

        assert!(!out.is_empty());
        let side = min_core_side(5.0, 256, 256, 64);
        assert!(out[0].rect.width >= side);
        assert!(out[0].rect.height >= side);
    }

    #[test]
    fn zero_map_produces_no_candidates_at_all() {
        let map = DiffMap::zeros(256, 256);
        let detector = MapRegionDetector::default();
        let out = detector.detect_from_diff_map(&map, &Settings::default());
        assert!(out.is_empty());
    }

    #[test]
    fn sub_threshold_energy_falls_back_to_tiles() {
        // Energy well below the strictest threshold but nonzero.
        let map = map_with_blob(256, 256, IntRect::new(40, 40, 10, 10), 0.3);
        let detector = MapRegionDetector::default();
        let settings = Settings::with_precision(1).unwrap();
        let out = detector.detect_from_diff_map(&map, &settings);

        assert!(!out.is_empty());
        assert!(out.len() <= detector.params().tile_top_k);
        assert!(out
            .iter()
            .all(|c| c.provenance == super::super::Provenance::TileFallback));
    }

    #[test]
    fn candidate_count_is_non_decreasing_in_precision() {
        // Several blobs at staggered strengths across the threshold schedule.
        let mut map = DiffMap::zeros(256, 256);
        for (i, v) in [0.95f32, 0.88, 0.82, 0.76, 0.68, 0.62].iter().enumerate() {
            let x0 = 20 + (i as i32 % 3) * 80;
            let y0 = 20 + (i as i32 / 3) * 120;
            for y in y0..(y0 + 4) {
                for x in x0..(x0 + 4) {
                    map.set(x as u32, y as u32, *v);
                }
            }
        }

        let mut prev = 0usize;
        for p in 1..=7u8 {
            let threshold = detection_threshold(p);
            let count = component_boxes(&map, threshold).len();
            assert!(
                count >= prev,
                "candidate count {} at p={} fell below {}",
                count,
                p,
                prev
            );
            prev = count;
        }
    }
}
