//! Homography and similarity-transform estimation.
//!
//! Provides:
//! - [`Homography`]: 3×3 projective transform with compose/invert/apply.
//! - Direct Linear Transform (DLT) from ≥4 point correspondences with
//!   Hartley normalization.
//! - Seeded RANSAC wrappers for outlier-robust homography and
//!   rotation+uniform-scale+translation (similarity) fitting.

mod core;
mod ransac;
mod similarity;

pub use core::{estimate_homography_dlt, EstimationError, Homography};
pub use ransac::{fit_homography_ransac, RansacConfig, RansacHomographyResult};
pub use similarity::{fit_similarity_lsq, fit_similarity_ransac, Similarity};
