//! Seeded RANSAC homography fitting over point correspondences.

use rand::prelude::*;

use super::core::{estimate_homography_dlt, reprojection_error, EstimationError, Homography};

/// RANSAC configuration shared by the homography and similarity estimators.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RansacConfig {
    /// Maximum number of RANSAC iterations.
    pub max_iters: usize,
    /// Inlier threshold (reprojection error in pixels).
    pub inlier_threshold: f64,
    /// Minimum number of inliers for a valid model.
    pub min_inliers: usize,
    /// Random seed.
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            inlier_threshold: 1.1,
            min_inliers: 20,
            seed: 0,
        }
    }
}

/// Result of RANSAC homography fitting.
#[derive(Debug, Clone)]
pub struct RansacHomographyResult {
    /// The fitted homography.
    pub h: Homography,
    /// Boolean mask: true for inliers.
    pub inlier_mask: Vec<bool>,
    /// Number of inliers.
    pub n_inliers: usize,
}

/// Sample `K` distinct indices in `0..n`, giving up after a bounded number
/// of retries on unlucky draws.
pub(super) fn sample_distinct<const K: usize>(rng: &mut StdRng, n: usize) -> [usize; K] {
    let mut indices = [0usize; K];
    let mut attempts = 0;
    loop {
        for idx in &mut indices {
            *idx = rng.gen_range(0..n);
        }
        let mut ok = true;
        for i in 0..K {
            for j in (i + 1)..K {
                if indices[i] == indices[j] {
                    ok = false;
                }
            }
        }
        if ok {
            break;
        }
        attempts += 1;
        if attempts > 100 {
            break;
        }
    }
    indices
}

/// Fit a homography with RANSAC: repeated minimal 4-point DLT solves, inlier
/// counting, then a final refit over the best consensus set.
pub fn fit_homography_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    config: &RansacConfig,
) -> Result<RansacHomographyResult, EstimationError> {
    let n = src.len();
    if n < 4 {
        return Err(EstimationError::TooFewPoints { needed: 4, got: n });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut best_inliers = 0usize;
    let mut best_mask: Vec<bool> = vec![false; n];
    let mut best_h = Homography::identity();

    for _ in 0..config.max_iters {
        let indices = sample_distinct::<4>(&mut rng, n);

        let s4: Vec<[f64; 2]> = indices.iter().map(|&i| src[i]).collect();
        let d4: Vec<[f64; 2]> = indices.iter().map(|&i| dst[i]).collect();

        let h = match estimate_homography_dlt(&s4, &d4) {
            Ok(h) => h,
            Err(_) => continue,
        };

        let mut count = 0usize;
        let mut mask = vec![false; n];
        for i in 0..n {
            if reprojection_error(&h, &src[i], &dst[i]) < config.inlier_threshold {
                mask[i] = true;
                count += 1;
            }
        }

        if count > best_inliers {
            best_inliers = count;
            best_mask = mask;
            best_h = h;

            // Early exit if >90% inliers
            if count * 10 > n * 9 {
                break;
            }
        }
    }

    if best_inliers < config.min_inliers {
        return Err(EstimationError::InsufficientInliers {
            needed: config.min_inliers,
            found: best_inliers,
        });
    }

    // Refit using all inliers
    let inlier_src: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| src[i]).collect();
    let inlier_dst: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| dst[i]).collect();
    let h_refit = estimate_homography_dlt(&inlier_src, &inlier_dst).unwrap_or(best_h);

    let mut final_mask = vec![false; n];
    let mut final_inliers = 0usize;
    for i in 0..n {
        if reprojection_error(&h_refit, &src[i], &dst[i]) < config.inlier_threshold {
            final_mask[i] = true;
            final_inliers += 1;
        }
    }

    Ok(RansacHomographyResult {
        h: h_refit,
        inlier_mask: final_mask,
        n_inliers: final_inliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ransac_recovers_translation_under_outliers() {
        let h_true = Homography::from_similarity(1.0, 0.0, 7.0, -4.0);
        let mut rng = StdRng::seed_from_u64(42);

        let mut src = Vec::new();
        let mut dst = Vec::new();
        for i in 0..30 {
            let s = [(i % 6) as f64 * 30.0 + 10.0, (i / 6) as f64 * 30.0 + 10.0];
            let d = h_true.apply(s[0], s[1]);
            src.push(s);
            dst.push([d[0] + rng.gen_range(-0.2..0.2), d[1] + rng.gen_range(-0.2..0.2)]);
        }
        for _ in 0..10 {
            src.push([rng.gen_range(0.0..200.0), rng.gen_range(0.0..200.0)]);
            dst.push([rng.gen_range(0.0..200.0), rng.gen_range(0.0..200.0)]);
        }

        let config = RansacConfig {
            max_iters: 2000,
            inlier_threshold: 1.1,
            min_inliers: 20,
            seed: 7,
        };
        let result = fit_homography_ransac(&src, &dst, &config).unwrap();
        assert!(result.n_inliers >= 25, "only {} inliers", result.n_inliers);

        let p = result.h.apply(100.0, 100.0);
        assert!((p[0] - 107.0).abs() < 0.5);
        assert!((p[1] - 96.0).abs() < 0.5);
    }

    #[test]
    fn ransac_reports_insufficient_inliers_on_noise() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut src = Vec::new();
        let mut dst = Vec::new();
        for _ in 0..25 {
            src.push([rng.gen_range(0.0..300.0), rng.gen_range(0.0..300.0)]);
            dst.push([rng.gen_range(0.0..300.0), rng.gen_range(0.0..300.0)]);
        }

        let config = RansacConfig::default();
        match fit_homography_ransac(&src, &dst, &config) {
            Err(EstimationError::InsufficientInliers { needed, .. }) => assert_eq!(needed, 20),
            other => panic!("expected InsufficientInliers, got {:?}", other.map(|r| r.n_inliers)),
        }
    }
}
