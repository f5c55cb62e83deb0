//! Candidate extraction from the difference map: thresholded connected
//! components, supplemental local maxima, minimum-area enforcement, and the
//! tile-grid fallback.

use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use super::{Candidate, DetectorParams, Provenance};
use crate::diffmap::DiffMap;
use crate::rect::IntRect;

/// Peak score: the maximum map value inside the box. Peaks localize on the
/// sharpest point of a true difference instead of being diluted by
/// surrounding noise.
pub(crate) fn box_max_score(map: &DiffMap, rect: IntRect) -> f32 {
    let clamped = rect.clamp_to(map.width, map.height);
    let mut best = 0.0f32;
    for y in clamped.top..clamped.bottom() {
        for x in clamped.left..clamped.right() {
            let v = map.at(x as u32, y as u32);
            if v > best {
                best = v;
            }
        }
    }
    best
}

/// Bounding boxes of connected components of `map >= threshold`, peak-scored.
pub(crate) fn component_boxes(map: &DiffMap, threshold: f32) -> Vec<Candidate> {
    if map.width == 0 || map.height == 0 {
        return Vec::new();
    }

    let binary = GrayImage::from_fn(map.width, map.height, |x, y| {
        Luma([if map.at(x, y) >= threshold { 255u8 } else { 0u8 }])
    });
    let labels = connected_components(&binary, Connectivity::Four, Luma([0u8]));

    // Label -> (min_x, min_y, max_x, max_y)
    let mut bounds: HashMap<u32, (u32, u32, u32, u32)> = HashMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let id = label[0];
        if id == 0 {
            continue;
        }
        bounds
            .entry(id)
            .and_modify(|b| {
                b.0 = b.0.min(x);
                b.1 = b.1.min(y);
                b.2 = b.2.max(x);
                b.3 = b.3.max(y);
            })
            .or_insert((x, y, x, y));
    }

    let mut out: Vec<Candidate> = bounds
        .into_values()
        .map(|(x0, y0, x1, y1)| {
            let rect = IntRect::new(
                x0 as i32,
                y0 as i32,
                (x1 - x0 + 1) as i32,
                (y1 - y0 + 1) as i32,
            );
            Candidate {
                rect,
                score: box_max_score(map, rect),
                provenance: Provenance::FirstPass,
            }
        })
        .collect();

    // Deterministic order before any score sorting downstream.
    out.sort_by_key(|c| (c.rect.top, c.rect.left));
    out
}

/// Minimum core side from the area floor: `ceil(sqrt(min_area_px))`, clamped
/// to `[1, limit]`.
pub(crate) fn min_core_side(min_area_percent: f32, map_w: u32, map_h: u32, limit: i32) -> i32 {
    let min_area_px = (min_area_percent as f64 / 100.0) * (map_w as f64 * map_h as f64);
    let raw = min_area_px.sqrt().ceil() as i32;
    raw.clamp(1, limit.max(1))
}

/// Pad every candidate and raise undersized boxes to the minimum core side,
/// centered and clamped to the map bounds.
pub(crate) fn enforce_min_area(
    candidates: &mut [Candidate],
    params: &DetectorParams,
    min_side: i32,
    map_w: u32,
    map_h: u32,
) {
    for c in candidates.iter_mut() {
        c.rect = c
            .rect
            .expand_to_min_side(params.box_pad, min_side, map_w, map_h);
    }
}

/// Supplemental 2-D local maxima above `threshold`: points that dominate
/// their Chebyshev neighborhood of radius `min_distance`. Catches diffuse
/// differences that do not binarize into a clean connected component.
pub(crate) fn local_maxima_boxes(
    map: &DiffMap,
    threshold: f32,
    min_distance: u32,
) -> Vec<Candidate> {
    let r = min_distance as i32;
    let w = map.width as i32;
    let h = map.height as i32;
    let mut out = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let v = map.at(x as u32, y as u32);
            if v < threshold {
                continue;
            }

            let mut is_max = true;
            'scan: for dy in -r..=r {
                for dx in -r..=r {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let nv = map.at(nx as u32, ny as u32);
                    // Ties resolve to the earlier raster position.
                    if nv > v || (nv == v && (ny, nx) < (y, x)) {
                        is_max = false;
                        break 'scan;
                    }
                }
            }

            if is_max {
                out.push(Candidate {
                    rect: IntRect::new(x, y, 1, 1),
                    score: v,
                    provenance: Provenance::LocalMaxima,
                });
            }
        }
    }
    out
}

/// Tile-grid fallback: partition the map into `grid × grid` tiles, score
/// each by its max value, and emit the best `top_k` tiles whose peak clears
/// `tile_min_score`. Guarantees the pipeline is never silently empty while
/// signal exists.
pub(crate) fn tile_fallback_boxes(map: &DiffMap, params: &DetectorParams) -> Vec<Candidate> {
    let grid = params.tile_grid.max(1);
    if map.width == 0 || map.height == 0 {
        return Vec::new();
    }
    let tile_w = map.width.div_ceil(grid);
    let tile_h = map.height.div_ceil(grid);

    let mut tiles = Vec::new();
    for ty in 0..grid {
        for tx in 0..grid {
            let left = (tx * tile_w) as i32;
            let top = (ty * tile_h) as i32;
            let rect =
                IntRect::new(left, top, tile_w as i32, tile_h as i32).clamp_to(map.width, map.height);
            if rect.is_empty() {
                continue;
            }
            let score = box_max_score(map, rect);
            if score >= params.tile_min_score {
                tiles.push(Candidate {
                    rect,
                    score,
                    provenance: Provenance::TileFallback,
                });
            }
        }
    }

    tiles.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (a.rect.top, a.rect.left).cmp(&(b.rect.top, b.rect.left)))
    });
    tiles.truncate(params.tile_top_k);
    tiles
}
