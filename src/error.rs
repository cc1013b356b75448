//! Error type shared by the solver and the RANSAC loop.

use thiserror::Error;

/// Errors surfaced by homography estimation.
///
/// Only [`InsufficientCorrespondences`](EstimationError::InsufficientCorrespondences)
/// and [`NoModelFound`](EstimationError::NoModelFound) ever leave a RANSAC run;
/// [`DegenerateConfiguration`](EstimationError::DegenerateConfiguration) is
/// produced per trial by the DLT solver and absorbed by the loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("need at least 4 point correspondences, got {found}")]
    InsufficientCorrespondences { found: usize },
    #[error("degenerate configuration: {0}")]
    DegenerateConfiguration(&'static str),
    #[error("no model found: all {iterations} iterations were degenerate")]
    NoModelFound { iterations: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("mismatched input: {0}")]
    MismatchedInput(String),
}

pub type Result<T> = std::result::Result<T, EstimationError>;
