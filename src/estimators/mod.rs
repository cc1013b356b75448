//! Estimators for geometric models.
//!
//! Currently a single closed-form estimator: the 4-point DLT homography
//! solver.

pub mod homography;

pub use homography::{DltSolver, MINIMAL_SAMPLE_SIZE};
