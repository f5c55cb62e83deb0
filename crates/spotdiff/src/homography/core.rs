//! The [`Homography`] type and DLT estimation with Hartley normalization.

use nalgebra::{DMatrix, Matrix3, Vector3};

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum EstimationError {
    TooFewPoints { needed: usize, got: usize },
    NumericalFailure(String),
    InsufficientInliers { needed: usize, found: usize },
}

impl std::fmt::Display for EstimationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { needed, got } => {
                write!(f, "too few points: need {}, got {}", needed, got)
            }
            Self::NumericalFailure(msg) => write!(f, "numerical failure: {}", msg),
            Self::InsufficientInliers { needed, found } => {
                write!(f, "insufficient inliers: need {}, found {}", needed, found)
            }
        }
    }
}

impl std::error::Error for EstimationError {}

// ── Homography ───────────────────────────────────────────────────────────

/// 3×3 projective transform mapping one image plane onto another.
///
/// Identity is the safe fallback everywhere: warping with it reproduces the
/// input, so a failed estimation degrades detection instead of aborting it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn from_matrix(m: Matrix3<f64>) -> Self {
        Self(m)
    }

    /// Build from similarity parameters: uniform `scale`, rotation `angle`
    /// (radians), translation `(tx, ty)`.
    pub fn from_similarity(scale: f64, angle: f64, tx: f64, ty: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self(Matrix3::new(
            scale * c,
            -scale * s,
            tx,
            scale * s,
            scale * c,
            ty,
            0.0,
            0.0,
            1.0,
        ))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Composition: `self.compose(&other)` applies `other` first, then `self`.
    pub fn compose(&self, other: &Homography) -> Homography {
        Homography(self.0 * other.0)
    }

    pub fn try_inverse(&self) -> Option<Homography> {
        self.0.try_inverse().map(Homography)
    }

    /// Project a 2D point: H * [x, y, 1]^T → [u, v].
    pub fn apply(&self, x: f64, y: f64) -> [f64; 2] {
        let p = self.0 * Vector3::new(x, y, 1.0);
        if p[2].abs() < 1e-15 {
            return [f64::NAN, f64::NAN];
        }
        [p[0] / p[2], p[1] / p[2]]
    }

    /// Conjugate by a uniform axis scale: the returned homography acts on
    /// coordinates multiplied by `factor` the way `self` acts on the
    /// originals. Used to carry an alignment-resolution estimate over to the
    /// analysis resolution.
    pub fn rescaled(&self, factor: f64) -> Homography {
        let s = Matrix3::new(factor, 0.0, 0.0, 0.0, factor, 0.0, 0.0, 0.0, 1.0);
        let s_inv = Matrix3::new(
            1.0 / factor,
            0.0,
            0.0,
            0.0,
            1.0 / factor,
            0.0,
            0.0,
            0.0,
            1.0,
        );
        Homography(s * self.0 * s_inv)
    }

    /// Row-major array form for serialization.
    pub fn to_array(&self) -> [[f64; 3]; 3] {
        let m = &self.0;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

/// Reprojection error: ||apply(H, src) - dst||.
pub(crate) fn reprojection_error(h: &Homography, src: &[f64; 2], dst: &[f64; 2]) -> f64 {
    let p = h.apply(src[0], src[1]);
    let dx = p[0] - dst[0];
    let dy = p[1] - dst[1];
    (dx * dx + dy * dy).sqrt()
}

// ── Hartley normalization ────────────────────────────────────────────────

/// Compute a normalizing transform: translate centroid to origin, scale so
/// mean distance from origin is sqrt(2).
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx: f64 = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy: f64 = pts.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let normalized: Vec<[f64; 2]> = pts
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();

    (t, normalized)
}

// ── DLT ──────────────────────────────────────────────────────────────────

/// Estimate a homography from ≥4 point correspondences using DLT.
///
/// Returns H such that dst ≈ H(src).
pub fn estimate_homography_dlt(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> Result<Homography, EstimationError> {
    let n = src.len();
    if n < 4 || dst.len() < 4 {
        return Err(EstimationError::TooFewPoints {
            needed: 4,
            got: n.min(dst.len()),
        });
    }
    if src.len() != dst.len() {
        return Err(EstimationError::NumericalFailure(
            "src and dst must have the same length".into(),
        ));
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    // Build 2n × 9 matrix A
    let mut a = DMatrix::zeros(2 * n, 9);
    for i in 0..n {
        let (sx, sy) = (src_n[i][0], src_n[i][1]);
        let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // The solution is the eigenvector of A^T A with the smallest eigenvalue.
    let ata = a.transpose() * &a;
    let eig = nalgebra::SymmetricEigen::new(ata);

    let mut min_idx = 0;
    let mut min_val = eig.eigenvalues[0].abs();
    for i in 1..9 {
        let v = eig.eigenvalues[i].abs();
        if v < min_val {
            min_val = v;
            min_idx = i;
        }
    }
    let h_vec: Vec<f64> = (0..9).map(|j| eig.eigenvectors[(j, min_idx)]).collect();
    #[rustfmt::skip]
    let h_norm = Matrix3::new(
        h_vec[0], h_vec[1], h_vec[2],
        h_vec[3], h_vec[4], h_vec[5],
        h_vec[6], h_vec[7], h_vec[8],
    );

    // Denormalize: H = T_dst^-1 * H_norm * T_src
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| EstimationError::NumericalFailure("T_dst not invertible".into()))?;
    let h = t_dst_inv * h_norm * t_src;

    // Normalize so h[2][2] = 1 (if possible)
    let scale = h[(2, 2)];
    if scale.abs() < 1e-15 {
        Ok(Homography::from_matrix(h))
    } else {
        Ok(Homography::from_matrix(h / scale))
    }
}
