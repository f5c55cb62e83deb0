//! Similarity-transform (rotation + uniform scale + translation) estimation.
//!
//! Fallback model for image pairs where the full projective fit cannot reach
//! its inlier quota: fewer degrees of freedom, so it stays stable on sparse
//! or noisy match sets.

use rand::prelude::*;

use super::core::{reprojection_error, EstimationError, Homography};
use super::ransac::{sample_distinct, RansacConfig};

/// Rotation + uniform scale + translation in the plane.
#[derive(Debug, Clone, Copy)]
pub struct Similarity {
    pub scale: f64,
    pub angle: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Similarity {
    pub fn to_homography(self) -> Homography {
        Homography::from_similarity(self.scale, self.angle, self.tx, self.ty)
    }
}

/// Closed-form least-squares similarity over ≥2 correspondences.
///
/// Solves for `a = s·cosθ`, `b = s·sinθ` from centered cross terms, then the
/// translation from the centroids.
pub fn fit_similarity_lsq(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Similarity, EstimationError> {
    let n = src.len();
    if n < 2 || dst.len() < 2 {
        return Err(EstimationError::TooFewPoints {
            needed: 2,
            got: n.min(dst.len()),
        });
    }
    if src.len() != dst.len() {
        return Err(EstimationError::NumericalFailure(
            "src and dst must have the same length".into(),
        ));
    }

    let nf = n as f64;
    let (mut mx, mut my, mut ux, mut uy) = (0.0, 0.0, 0.0, 0.0);
    for (s, d) in src.iter().zip(dst.iter()) {
        mx += s[0];
        my += s[1];
        ux += d[0];
        uy += d[1];
    }
    mx /= nf;
    my /= nf;
    ux /= nf;
    uy /= nf;

    let mut a_num = 0.0;
    let mut b_num = 0.0;
    let mut denom = 0.0;
    for (s, d) in src.iter().zip(dst.iter()) {
        let (px, py) = (s[0] - mx, s[1] - my);
        let (qx, qy) = (d[0] - ux, d[1] - uy);
        a_num += px * qx + py * qy;
        b_num += px * qy - py * qx;
        denom += px * px + py * py;
    }
    if denom < 1e-12 {
        return Err(EstimationError::NumericalFailure(
            "degenerate source points".into(),
        ));
    }

    let a = a_num / denom;
    let b = b_num / denom;
    let scale = (a * a + b * b).sqrt();
    if scale < 1e-12 {
        return Err(EstimationError::NumericalFailure("zero scale".into()));
    }
    let angle = b.atan2(a);

    let (sin, cos) = angle.sin_cos();
    let tx = ux - scale * (cos * mx - sin * my);
    let ty = uy - scale * (sin * mx + cos * my);

    Ok(Similarity {
        scale,
        angle,
        tx,
        ty,
    })
}

/// Fit a similarity transform with RANSAC over 2-point minimal samples and
/// refit over the consensus set. Same config/threshold semantics as the
/// homography fitter so the two can share a fallback chain.
pub fn fit_similarity_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    config: &RansacConfig,
) -> Result<Similarity, EstimationError> {
    let n = src.len();
    if n < 2 {
        return Err(EstimationError::TooFewPoints { needed: 2, got: n });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut best_inliers = 0usize;
    let mut best_mask: Vec<bool> = vec![false; n];
    let mut best: Option<Similarity> = None;

    for _ in 0..config.max_iters {
        let indices = sample_distinct::<2>(&mut rng, n);
        let s2 = [src[indices[0]], src[indices[1]]];
        let d2 = [dst[indices[0]], dst[indices[1]]];

        let model = match fit_similarity_lsq(&s2, &d2) {
            Ok(m) => m,
            Err(_) => continue,
        };
        let h = model.to_homography();

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
            best = Some(model);

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

    let inlier_src: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| src[i]).collect();
    let inlier_dst: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| dst[i]).collect();
    let refit = fit_similarity_lsq(&inlier_src, &inlier_dst);

    // The minimal-sample winner still stands if the refit degenerates.
    refit.or(best.ok_or(EstimationError::InsufficientInliers {
        needed: config.min_inliers,
        found: 0,
    }))
}
