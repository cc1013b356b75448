//! Inlier-count scoring.
//!
//! A correspondence is an inlier when its residual under the candidate model
//! is strictly below the threshold. The score is the number of inliers.

use crate::core::Scoring;
use crate::models::Homography;
use crate::types::{CorrespondenceSet, PointCorrespondence};

/// Scalar score: the number of inliers. Larger is better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score {
    pub inlier_count: usize,
}

impl Score {
    pub fn new(inlier_count: usize) -> Self {
        Self { inlier_count }
    }
}

/// Residual function signature used by [`InlierCountScoring`].
pub type ResidualFn<M> = fn(&M, &PointCorrespondence) -> f64;

/// RANSAC-style scoring that counts inliers using a residual function.
pub struct InlierCountScoring<M> {
    threshold: f64,
    residual_fn: ResidualFn<M>,
}

impl<M> InlierCountScoring<M> {
    pub fn new(threshold: f64, residual_fn: ResidualFn<M>) -> Self {
        Self {
            threshold,
            residual_fn,
        }
    }
}

impl InlierCountScoring<Homography> {
    /// Score homographies by the one-way transfer error
    /// `‖perspective(H · source) − target‖`.
    pub fn transfer_error(threshold: f64) -> Self {
        Self::new(threshold, Homography::residual)
    }
}

impl<M> Scoring<M> for InlierCountScoring<M> {
    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn score(&self, data: &CorrespondenceSet, model: &M, inliers_out: &mut Vec<usize>) -> Score {
        inliers_out.clear();
        for (i, c) in data.iter().enumerate() {
            // NaN residuals fail the comparison and are never inliers.
            if (self.residual_fn)(model, c) < self.threshold {
                inliers_out.push(i);
            }
        }
        Score::new(inliers_out.len())
    }
}
