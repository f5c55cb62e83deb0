//! Multi-pass feature alignment.
//!
//! Estimates a homography mapping the right image onto the left from FAST +
//! BRIEF correspondences. Runs a fixed number of passes: each pass
//! re-extracts on the current warped right image and composes its estimate
//! with the accumulated transform. Per-pass fallback chain: full homography
//! RANSAC → similarity RANSAC → keep what is accumulated. Total failure
//! degrades to the identity homography; it never aborts the comparison.

use image::{GrayImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};

use crate::features::{
    detect_keypoints, match_descriptors_ratio_cross, BriefExtractor, FeatureConfig,
};
use crate::homography::{fit_homography_ransac, fit_similarity_ransac, Homography, RansacConfig};

/// Alignment-stage controls.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AlignmentConfig {
    /// Number of estimate/compose passes.
    pub passes: usize,
    /// Keypoint/descriptor extraction controls.
    pub features: FeatureConfig,
    /// Nearest/second-nearest ratio gate for descriptor matching.
    pub match_ratio: f32,
    /// RANSAC controls shared by the homography fit and similarity fallback.
    pub ransac: RansacConfig,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            passes: 2,
            features: FeatureConfig::default(),
            match_ratio: 0.76,
            ransac: RansacConfig::default(),
        }
    }
}

/// Outcome of the alignment stage.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Accumulated right→left homography.
    pub homography: Homography,
    /// Passes that produced an accepted estimate.
    pub passes_used: usize,
    /// True when no pass produced an estimate and identity is in effect.
    pub degraded: bool,
}

/// How a single pass produced its estimate.
enum PassEstimate {
    Homography(Homography, usize),
    Similarity(Homography, usize),
    Failed,
}

fn estimate_pass(
    left: &GrayImage,
    right: &GrayImage,
    extractor: &BriefExtractor,
    config: &AlignmentConfig,
) -> PassEstimate {
    let kps_l = detect_keypoints(left, &config.features);
    let kps_r = detect_keypoints(right, &config.features);
    if kps_l.len() < 4 || kps_r.len() < 4 {
        return PassEstimate::Failed;
    }

    let desc_l = extractor.describe_all(left, &kps_l);
    let desc_r = extractor.describe_all(right, &kps_r);
    let matches = match_descriptors_ratio_cross(&desc_l, &desc_r, config.match_ratio);
    if matches.len() < 4 {
        return PassEstimate::Failed;
    }

    // RANSAC fits the right→left mapping, so the matched right keypoints are
    // the source points.
    let src: Vec<[f64; 2]> = matches
        .iter()
        .map(|m| [kps_r[m.right].x as f64, kps_r[m.right].y as f64])
        .collect();
    let dst: Vec<[f64; 2]> = matches
        .iter()
        .map(|m| [kps_l[m.left].x as f64, kps_l[m.left].y as f64])
        .collect();

    match fit_homography_ransac(&src, &dst, &config.ransac) {
        Ok(result) => return PassEstimate::Homography(result.h, result.n_inliers),
        Err(err) => {
            tracing::debug!(%err, n_matches = matches.len(), "homography fit failed, trying similarity");
        }
    }

    // The similarity model has far fewer degrees of freedom, so it stays
    // usable on match sets too sparse for the projective quota.
    let relaxed = RansacConfig {
        min_inliers: (config.ransac.min_inliers / 2).max(4),
        ..config.ransac.clone()
    };
    match fit_similarity_ransac(&src, &dst, &relaxed) {
        Ok(sim) => PassEstimate::Similarity(sim.to_homography(), matches.len()),
        Err(err) => {
            tracing::debug!(%err, "similarity fallback failed");
            PassEstimate::Failed
        }
    }
}

/// Estimate the right→left alignment homography over up to `config.passes`
/// passes, composing per-pass estimates.
pub fn estimate_alignment(
    left: &GrayImage,
    right: &GrayImage,
    config: &AlignmentConfig,
) -> Alignment {
    let extractor = BriefExtractor::new(&config.features);
    let (w, h) = left.dimensions();

    let mut accumulated = Homography::identity();
    let mut passes_used = 0usize;

    for pass in 0..config.passes {
        // Re-estimate on the right image as currently warped.
        let current = if passes_used == 0 {
            right.clone()
        } else {
            warp_gray(right, &accumulated, w, h)
        };

        match estimate_pass(left, &current, &extractor, config) {
            PassEstimate::Homography(h_pass, n_inliers) => {
                tracing::debug!(pass, n_inliers, "alignment pass accepted (homography)");
                accumulated = h_pass.compose(&accumulated);
                passes_used += 1;
            }
            PassEstimate::Similarity(h_pass, n_matches) => {
                tracing::debug!(pass, n_matches, "alignment pass accepted (similarity fallback)");
                accumulated = h_pass.compose(&accumulated);
                passes_used += 1;
            }
            PassEstimate::Failed => break,
        }
    }

    // Warping needs the inverse; an uninvertible accumulate degrades to identity.
    let degraded = passes_used == 0 || accumulated.try_inverse().is_none();
    if degraded {
        tracing::warn!("alignment failed; proceeding with identity homography");
        accumulated = Homography::identity();
    }

    Alignment {
        homography: accumulated,
        passes_used,
        degraded,
    }
}

fn projection_from_homography(h: &Homography) -> Option<Projection> {
    let m = h.matrix();
    #[rustfmt::skip]
    let row_major = [
        m[(0, 0)] as f32, m[(0, 1)] as f32, m[(0, 2)] as f32,
        m[(1, 0)] as f32, m[(1, 1)] as f32, m[(1, 2)] as f32,
        m[(2, 0)] as f32, m[(2, 1)] as f32, m[(2, 2)] as f32,
    ];
    Projection::from_matrix(row_major)
}

/// Warp a grayscale image by `h`, bilinear sampling, black fill.
pub fn warp_gray(src: &GrayImage, h: &Homography, out_w: u32, out_h: u32) -> GrayImage {
    let src = ensure_dims_gray(src, out_w, out_h);
    match projection_from_homography(h) {
        Some(p) => warp(&src, &p, Interpolation::Bilinear, image::Luma([0])),
        None => src,
    }
}

/// Warp an RGBA image by `h`, bilinear sampling, transparent-black fill.
pub fn warp_rgba(src: &RgbaImage, h: &Homography, out_w: u32, out_h: u32) -> RgbaImage {
    let src = ensure_dims_rgba(src, out_w, out_h);
    match projection_from_homography(h) {
        Some(p) => warp(&src, &p, Interpolation::Bilinear, Rgba([0, 0, 0, 0])),
        None => src,
    }
}

fn ensure_dims_gray(src: &GrayImage, w: u32, h: u32) -> GrayImage {
    if src.dimensions() == (w, h) {
        src.clone()
    } else {
        crate::sampling::resize_gray_bilinear(src, w, h)
    }
}

fn ensure_dims_rgba(src: &RgbaImage, w: u32, h: u32) -> RgbaImage {
    if src.dimensions() == (w, h) {
        src.clone()
    } else {
        crate::sampling::resize_rgba_bilinear(src, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{shifted_gray, textured_gray};

    #[test]
    fn identical_images_align_to_near_identity() {
        let img = textured_gray(384, 384, 5);
        let alignment = estimate_alignment(&img, &img, &AlignmentConfig::default());
        assert!(!alignment.degraded);

        let center = alignment.homography.apply(192.0, 192.0);
        assert!((center[0] - 192.0).abs() < 1.0);
        assert!((center[1] - 192.0).abs() < 1.0);
    }

    #[test]
    fn pure_translation_is_recovered_at_the_center_point() {
        let (dx, dy) = (6i32, 4i32);
        let left = textured_gray(384, 384, 5);
        let right = shifted_gray(&left, dx, dy);

        let alignment = estimate_alignment(&left, &right, &AlignmentConfig::default());
        assert!(!alignment.degraded, "alignment must not degrade on a clean shift");

        // right content at (x, y) equals left content at (x + dx, y + dy), so
        // the right->left mapping should move the center by (dx, dy).
        let p = alignment.homography.apply(192.0, 192.0);
        assert!(
            (p[0] - (192.0 + dx as f64)).abs() < 1.5,
            "center x mapped to {}, expected {}",
            p[0],
            192.0 + dx as f64
        );
        assert!(
            (p[1] - (192.0 + dy as f64)).abs() < 1.5,
            "center y mapped to {}, expected {}",
            p[1],
            192.0 + dy as f64
        );
    }

    #[test]
    fn featureless_pair_degrades_to_identity() {
        let flat = GrayImage::from_pixel(384, 384, image::Luma([128]));
        let alignment = estimate_alignment(&flat, &flat, &AlignmentConfig::default());
        assert!(alignment.degraded);
        assert_eq!(alignment.homography, Homography::identity());
    }

    #[test]
    fn warp_with_identity_preserves_content() {
        let img = textured_gray(64, 64, 9);
        let out = warp_gray(&img, &Homography::identity(), 64, 64);
        assert_eq!(img.get_pixel(20, 20), out.get_pixel(20, 20));
    }

    #[test]
    fn warp_applies_forward_translation() {
        let mut img = GrayImage::from_pixel(64, 64, image::Luma([0]));
        img.put_pixel(10, 10, image::Luma([255]));

        let h = Homography::from_similarity(1.0, 0.0, 5.0, 3.0);
        let out = warp_gray(&img, &h, 64, 64);
        assert_eq!(out.get_pixel(15, 13)[0], 255);
    }
}
