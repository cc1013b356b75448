//! Configuration types for the DLT solver and the RANSAC loop.
//!
//! Every settings struct has a `Default` and deserializes with
//! `#[serde(default)]`, so a partial JSON/TOML document only needs to name the
//! fields it overrides.

use serde::{Deserialize, Serialize};

use crate::error::{EstimationError, Result};

/// Tolerances used by the 4-point DLT solver to reject degenerate samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DltSettings {
    /// Relative area below which three sample points count as collinear.
    pub collinearity_tolerance: f64,
    /// The smallest singular value must be below `1 - separation_tolerance`
    /// times the second smallest.
    pub separation_tolerance: f64,
    /// Second-smallest singular value, relative to the largest, below which
    /// the coefficient matrix counts as rank deficient.
    pub rank_tolerance: f64,
    /// Condition both point sets (Hartley normalization) before solving.
    /// Without it the singular value tests depend on the coordinate scale.
    pub normalize: bool,
}

impl Default for DltSettings {
    fn default() -> Self {
        Self {
            collinearity_tolerance: 1e-9,
            separation_tolerance: 1e-3,
            rank_tolerance: 1e-10,
            normalize: true,
        }
    }
}

/// Main configuration object for a RANSAC run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacSettings {
    /// Maximum number of iterations (trials).
    pub max_iterations: usize,
    /// Minimum number of iterations; only consulted when `confidence` lowers
    /// the budget.
    pub min_iterations: usize,
    /// Inlier threshold on the Euclidean residual, in point units (pixels).
    /// A correspondence is an inlier when its residual is strictly smaller.
    pub inlier_threshold: f64,
    /// Desired confidence in `(0, 1)` for adaptive early stopping. `None`
    /// keeps the fixed iteration budget.
    pub confidence: Option<f64>,
    /// Refit the best model on all of its inliers once the loop finishes.
    pub refine_on_inliers: bool,
    /// Number of workers for [`run_parallel`](crate::RansacEstimator::run_parallel).
    /// `None` uses the size of the rayon thread pool.
    pub workers: Option<usize>,
    pub dlt: DltSettings,
}

impl Default for RansacSettings {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            min_iterations: 0,
            inlier_threshold: 1.0,
            confidence: None,
            refine_on_inliers: false,
            workers: None,
            dlt: DltSettings::default(),
        }
    }
}

impl RansacSettings {
    /// Default settings with the given inlier threshold.
    pub fn with_threshold(inlier_threshold: f64) -> Self {
        Self {
            inlier_threshold,
            ..Self::default()
        }
    }

    /// Default settings with the given threshold and iteration budget.
    pub fn with_threshold_and_iterations(inlier_threshold: f64, max_iterations: usize) -> Self {
        Self {
            inlier_threshold,
            max_iterations,
            ..Self::default()
        }
    }

    /// Check that every field lies in its valid range.
    pub fn validate(&self) -> Result<()> {
        if !(self.inlier_threshold.is_finite() && self.inlier_threshold > 0.0) {
            return Err(EstimationError::InvalidParameter(format!(
                "inlier threshold must be positive and finite, got {}",
                self.inlier_threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(EstimationError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if let Some(confidence) = self.confidence {
            if !(confidence > 0.0 && confidence < 1.0) {
                return Err(EstimationError::InvalidParameter(format!(
                    "confidence must lie in (0, 1), got {confidence}"
                )));
            }
        }
        if self.workers == Some(0) {
            return Err(EstimationError::InvalidParameter(
                "workers must be at least 1".to_string(),
            ));
        }
        let dlt = &self.dlt;
        if !(dlt.separation_tolerance > 0.0 && dlt.separation_tolerance < 1.0) {
            return Err(EstimationError::InvalidParameter(format!(
                "separation tolerance must lie in (0, 1), got {}",
                dlt.separation_tolerance
            )));
        }
        if dlt.collinearity_tolerance < 0.0 || dlt.rank_tolerance < 0.0 {
            return Err(EstimationError::InvalidParameter(
                "DLT tolerances must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
