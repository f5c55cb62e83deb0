//! Candidate deduplication and refinement: greedy IoU suppression,
//! tail-mean rescoring, and the slot-budgeted second pass.

use std::cmp::Ordering;

use super::{Candidate, DetectorParams};
use crate::diffmap::DiffMap;
use crate::rect::IntRect;

fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.rect.area().cmp(&a.rect.area()))
            .then_with(|| (a.rect.top, a.rect.left).cmp(&(b.rect.top, b.rect.left)))
    });
}

/// Greedy non-max suppression: iterate in score order, keep a candidate only
/// if its IoU against every already-kept candidate stays below the threshold.
pub(crate) fn run_nms(
    mut candidates: Vec<Candidate>,
    iou_threshold: f64,
    max_keep: usize,
) -> Vec<Candidate> {
    sort_candidates(&mut candidates);

    let mut kept: Vec<Candidate> = Vec::new();
    for c in candidates {
        if kept.len() >= max_keep {
            break;
        }
        let overlaps = kept.iter().any(|k| k.rect.iou(c.rect) > iou_threshold);
        if !overlaps {
            kept.push(c);
        }
    }
    kept
}

/// Conservative confidence: the mean of the lowest `fraction` of map values
/// inside the box (at least one sample). A peak surrounded by low support
/// ranks below a region that is strong throughout.
pub(crate) fn tail_mean_score(map: &DiffMap, rect: IntRect, fraction: f32) -> f32 {
    let clamped = rect.clamp_to(map.width, map.height);
    if clamped.is_empty() {
        return 0.0;
    }

    let mut values = Vec::with_capacity(clamped.area() as usize);
    for y in clamped.top..clamped.bottom() {
        for x in clamped.left..clamped.right() {
            values.push(map.at(x as u32, y as u32));
        }
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let n_tail = ((values.len() as f32 * fraction).ceil() as usize).max(1);
    let tail = &values[..n_tail.min(values.len())];
    tail.iter().sum::<f32>() / tail.len() as f32
}

/// Full refinement: first-pass NMS, tail-mean rescoring, then a second
/// suppression pass that merges the supplemental candidate set under the
/// remaining-slots budget.
pub(crate) fn refine_candidates(
    map: &DiffMap,
    first_pass: Vec<Candidate>,
    supplemental: Vec<Candidate>,
    params: &DetectorParams,
) -> Vec<Candidate> {
    // First-pass suppression on peak scores.
    let kept = run_nms(first_pass, params.nms_iou_threshold, params.max_results);

    // Tail-mean rescoring of the survivors.
    let mut refined: Vec<Candidate> = kept
        .into_iter()
        .map(|mut c| {
            c.score = tail_mean_score(map, c.rect, params.tail_fraction);
            c
        })
        .collect();

    // Second pass: admit supplemental candidates into the remaining slots,
    // suppressed against everything already kept.
    let remaining_slots = params.max_results.saturating_sub(refined.len());
    if remaining_slots > 0 && !supplemental.is_empty() {
        let mut extra = supplemental;
        sort_candidates(&mut extra);

        let mut admitted = 0usize;
        for c in extra {
            if admitted >= remaining_slots {
                break;
            }
            let overlaps = refined
                .iter()
                .any(|k| k.rect.iou(c.rect) > params.nms_iou_threshold);
            if !overlaps {
                refined.push(c);
                admitted += 1;
            }
        }
    }

    sort_candidates(&mut refined);
    refined.truncate(params.max_results);
    refined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Provenance;

    fn cand(rect: IntRect, score: f32) -> Candidate {
        Candidate {
            rect,
            score,
            provenance: Provenance::FirstPass,
        }
    }

    #[test]
    fn nms_keeps_exactly_the_higher_scoring_overlap() {
        let a = cand(IntRect::new(10, 10, 20, 20), 0.9);
        let b = cand(IntRect::new(12, 12, 20, 20), 0.7); // IoU ~0.68
        let kept = run_nms(vec![b, a], 0.3, 10);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].rect, IntRect::new(10, 10, 20, 20));
        assert!((kept[0].score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn nms_keeps_disjoint_candidates() {
        let a = cand(IntRect::new(0, 0, 10, 10), 0.9);
        let b = cand(IntRect::new(50, 50, 10, 10), 0.5);
        let kept = run_nms(vec![a, b], 0.3, 10);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn nms_respects_max_keep() {
        let cands: Vec<Candidate> = (0..20)
            .map(|i| cand(IntRect::new(i * 30, 0, 10, 10), 1.0 - i as f32 * 0.01))
            .collect();
        let kept = run_nms(cands, 0.3, 5);
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn tail_mean_is_more_conservative_than_the_peak() {
        let mut map = DiffMap::zeros(16, 16);
        let rect = IntRect::new(0, 0, 4, 4);
        // One strong pixel in an otherwise weak box.
        for y in 0..4 {
            for x in 0..4 {
                map.set(x, y, 0.1);
            }
        }
        map.set(1, 1, 1.0);

        let tail = tail_mean_score(&map, rect, 0.25);
        assert!(tail < 0.2, "tail mean {} should stay near the weak floor", tail);
    }

    #[test]
    fn tail_mean_of_uniform_box_matches_the_level() {
        let mut map = DiffMap::zeros(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                map.set(x, y, 0.6);
            }
        }
        let v = tail_mean_score(&map, IntRect::new(0, 0, 8, 8), 0.25);
        assert!((v - 0.6).abs() < 1e-6);
    }

    #[test]
    fn second_pass_respects_the_result_cap() {
        let map = DiffMap::zeros(256, 256);
        let first: Vec<Candidate> = (0..8)
            .map(|i| cand(IntRect::new(i * 30, 0, 10, 10), 0.9))
            .collect();
        let supplemental: Vec<Candidate> = (0..8)
            .map(|i| cand(IntRect::new(i * 30, 100, 10, 10), 0.8))
            .collect();

        let params = DetectorParams::default();
        let out = refine_candidates(&map, first, supplemental, &params);
        assert!(out.len() <= params.max_results);
        // 8 first-pass survivors + at most 2 admitted supplementals.
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn supplemental_overlapping_a_survivor_is_suppressed() {
        let mut map = DiffMap::zeros(64, 64);
        for y in 10..20 {
            for x in 10..20 {
                map.set(x, y, 0.9);
            }
        }
        let first = vec![cand(IntRect::new(10, 10, 10, 10), 0.9)];
        let supplemental = vec![Candidate {
            rect: IntRect::new(11, 11, 10, 10),
            score: 0.95,
            provenance: Provenance::LocalMaxima,
        }];

        let out = refine_candidates(&map, first, supplemental, &DetectorParams::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].provenance, Provenance::FirstPass);
    }

    #[test]
    fn final_order_is_deterministic_score_then_area() {
        let map = DiffMap::zeros(64, 64);
        let first = vec![
            cand(IntRect::new(0, 0, 4, 4), 0.0),
            cand(IntRect::new(40, 40, 8, 8), 0.0),
        ];
        // Zero map: both rescore to 0.0; the larger box must come first.
        let out = refine_candidates(&map, first, Vec::new(), &DetectorParams::default());
        assert_eq!(out[0].rect, IntRect::new(40, 40, 8, 8));
    }
}
