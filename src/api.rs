//! High-level API.
//!
//! Thin wrappers around [`RansacEstimator`] for the common cases: a
//! correspondence set with a threshold and an iteration count, or two N×2
//! point matrices with a seed.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::Result;
use crate::ransac::{RansacEstimator, RansacResult};
use crate::settings::RansacSettings;
use crate::types::CorrespondenceSet;

/// Run RANSAC with default solver settings.
///
/// # Arguments
/// * `correspondences` - Source/target point pairs, at least four
/// * `threshold` - Inlier threshold in pixels, must be positive
/// * `max_iterations` - Number of trials, must be positive
/// * `rng` - Random source used to draw the samples
///
/// # Returns
/// `RansacResult` with the best homography and its inliers.
pub fn ransac<R: RngCore + ?Sized>(
    correspondences: &CorrespondenceSet,
    threshold: f64,
    max_iterations: usize,
    rng: &mut R,
) -> Result<RansacResult> {
    let settings = RansacSettings::with_threshold_and_iterations(threshold, max_iterations);
    RansacEstimator::new(settings)?.run(correspondences, rng)
}

/// Estimate a homography from 2D point correspondences.
///
/// # Arguments
/// * `points1` - Source points (Nx2 matrix)
/// * `points2` - Target points (Nx2 matrix)
/// * `threshold` - Inlier threshold in pixels, overrides `settings`
/// * `settings` - Optional RANSAC settings (uses defaults if None)
/// * `seed` - Seed for the random source
///
/// # Returns
/// `RansacResult` with the best homography and its inliers. Runs in parallel
/// when `settings.workers` is set.
pub fn estimate_homography(
    points1: &DMatrix<f64>,
    points2: &DMatrix<f64>,
    threshold: f64,
    settings: Option<RansacSettings>,
    seed: u64,
) -> Result<RansacResult> {
    let data = CorrespondenceSet::from_matrices(points1, points2)?;
    let settings = RansacSettings {
        inlier_threshold: threshold,
        ..settings.unwrap_or_default()
    };
    let estimator = RansacEstimator::new(settings)?;

    if estimator.settings().workers.is_some() {
        estimator.run_parallel(&data, seed)
    } else {
        estimator.run(&data, &mut StdRng::seed_from_u64(seed))
    }
}
