//! Pipeline orchestration: sampling → alignment → difference map →
//! detection → refinement → remapping.
//!
//! Every stage has a defined degraded output; nothing in here aborts a
//! comparison. Degenerate inputs produce an empty outcome, estimation
//! failures fall back toward identity, and an empty detection falls back to
//! grid tiles inside the detector.

use image::RgbaImage;

use crate::alignment::{estimate_alignment, warp_rgba};
use crate::config::CompareConfig;
use crate::detector::{Candidate, RegionDetector};
use crate::diffmap::{
    color_diff_map, edge_common_map, fuse_maps, ssim_map, suppress_common_edges, DiffMap,
};
use crate::pipeline::{AlignmentReport, CompareOutcome, ScoredBox};
use crate::rect::Rect;
use crate::sampling::{box_blur_gray, extract_rgba_region, gray_from_rgba, resize_rgba_bilinear};
use crate::scorer::{blend_scores, RegionScorer};
use crate::settings::Settings;

fn sort_boxes(boxes: &mut [ScoredBox]) {
    boxes.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.rect.area().cmp(&a.rect.area()))
            .then_with(|| (a.rect.top, a.rect.left).cmp(&(b.rect.top, b.rect.left)))
    });
}

fn finalize(
    mut outcome: CompareOutcome,
    candidates: Vec<Candidate>,
    left: Option<&RgbaImage>,
    scorer: Option<&dyn RegionScorer>,
) -> CompareOutcome {
    let space = outcome.left_space();
    let mut boxes: Vec<ScoredBox> = candidates
        .into_iter()
        .map(|c| ScoredBox {
            rect: space.analysis_to_full(c.rect),
            score: c.score,
            provenance: c.provenance,
        })
        .collect();

    if let (Some(scorer), Some(left)) = (scorer, left) {
        for b in &mut boxes {
            let model = scorer.score_region(left, b.rect);
            b.score = blend_scores(b.score, model);
        }
    }

    sort_boxes(&mut boxes);
    outcome.boxes = boxes;
    outcome
}

/// Full comparison over two images with independent normalized crops.
pub(crate) fn run_compare(
    left: &RgbaImage,
    left_crop: Rect,
    right: &RgbaImage,
    right_crop: Rect,
    settings: &Settings,
    config: &CompareConfig,
    detector: &dyn RegionDetector,
    scorer: Option<&dyn RegionScorer>,
) -> CompareOutcome {
    let analysis = config.analysis_size;

    let (Some(region_l), Some(region_r)) = (
        extract_rgba_region(left, left_crop),
        extract_rgba_region(right, right_crop),
    ) else {
        tracing::info!("degenerate input (empty image or zero-area crop); empty result");
        return CompareOutcome::empty(analysis, analysis);
    };

    let left_crop_px = left_crop.to_pixels(left.width(), left.height());
    let right_crop_px = right_crop.to_pixels(right.width(), right.height());

    // Alignment at its own working resolution.
    let align_size = config.alignment_size;
    let align_l = gray_from_rgba(&resize_rgba_bilinear(&region_l, align_size, align_size));
    let align_r = gray_from_rgba(&resize_rgba_bilinear(&region_r, align_size, align_size));
    let alignment = estimate_alignment(&align_l, &align_r, &config.alignment);
    tracing::info!(
        passes_used = alignment.passes_used,
        degraded = alignment.degraded,
        "alignment complete"
    );

    // Analysis pair: right is warped onto the left with the estimate carried
    // over to analysis resolution.
    let analysis_l = resize_rgba_bilinear(&region_l, analysis, analysis);
    let analysis_r_raw = resize_rgba_bilinear(&region_r, analysis, analysis);
    let h_analysis = alignment
        .homography
        .rescaled(analysis as f64 / align_size as f64);
    let analysis_r = warp_rgba(&analysis_r_raw, &h_analysis, analysis, analysis);

    // Difference map: blurred-gray SSIM + suppressed color term, fused.
    let gray_l = box_blur_gray(&gray_from_rgba(&analysis_l), config.diff.blur_radius);
    let gray_r = box_blur_gray(&gray_from_rgba(&analysis_r), config.diff.blur_radius);

    let structural = ssim_map(&gray_l, &gray_r, config.diff.ssim_window);
    let mut color = color_diff_map(&analysis_l, &analysis_r);
    let common = edge_common_map(&gray_l, &gray_r);
    suppress_common_edges(&mut color, &common, config.diff.edge_suppression_strength);
    let fused = fuse_maps(&structural, &color, config.diff.structural_weight);

    let candidates = detector.detect_from_diff_map(&fused, settings);
    tracing::info!(n_candidates = candidates.len(), "detection complete");

    let outcome = CompareOutcome {
        boxes: Vec::new(),
        diff_map: fused,
        analysis_size: [analysis, analysis],
        alignment: AlignmentReport {
            homography: alignment.homography.to_array(),
            passes_used: alignment.passes_used,
            degraded: alignment.degraded,
        },
        left_crop: left_crop_px,
        right_crop: right_crop_px,
    };
    finalize(outcome, candidates, Some(left), scorer)
}

/// Override-detector fast path: the injected detector receives a zeroed
/// analysis-size map and sampling/alignment never run. Substitution stays
/// cheap for test doubles and alternative detectors.
pub(crate) fn run_with_override(
    left_dims: (u32, u32),
    left_crop: Rect,
    right_dims: (u32, u32),
    right_crop: Rect,
    settings: &Settings,
    config: &CompareConfig,
    detector: &dyn RegionDetector,
) -> CompareOutcome {
    let analysis = config.analysis_size;
    let (lw, lh) = left_dims;
    let (rw, rh) = right_dims;
    if lw == 0 || lh == 0 || rw == 0 || rh == 0 || left_crop.is_degenerate() {
        return CompareOutcome::empty(analysis, analysis);
    }

    let map = DiffMap::zeros(analysis, analysis);
    let candidates = detector.detect_from_diff_map(&map, settings);
    tracing::debug!(
        n_candidates = candidates.len(),
        "override detector fast path"
    );

    let outcome = CompareOutcome {
        boxes: Vec::new(),
        diff_map: map,
        analysis_size: [analysis, analysis],
        alignment: AlignmentReport::default(),
        left_crop: left_crop.to_pixels(lw, lh),
        right_crop: right_crop.to_pixels(rw, rh),
    };
    finalize(outcome, candidates, None, None)
}
