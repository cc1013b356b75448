//! # Homography RANSAC - Robust Planar Homography Estimation
//!
//! `homography_ransac` estimates the projective transform that best aligns
//! two sets of corresponding 2D points when many of the correspondences are
//! wrong. A closed-form 4-point DLT solver produces candidates and RANSAC
//! keeps the one with the most inliers.
//!
//! ## Quick Start
//!
//! ```rust
//! use homography_ransac::{ransac, CorrespondenceSet, PointCorrespondence};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let set: CorrespondenceSet = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
//!     .iter()
//!     .map(|&(x, y)| PointCorrespondence::from_coords(x, y, x + 5.0, y + 5.0))
//!     .collect();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let result = ransac(&set, 0.5, 100, &mut rng).unwrap();
//! assert_eq!(result.inlier_count, 4);
//! ```
//!
//! ## Extending the Library
//!
//! The consensus loop in [`core`] is generic over four traits:
//!
//! - **[`Estimator`](core::Estimator)**: fits a model to a minimal sample
//! - **[`Sampler`](core::Sampler)**: draws sample indices
//! - **[`Scoring<M>`](core::Scoring)**: counts the inliers of a model
//! - **[`TerminationCriterion`](core::TerminationCriterion)**: may shorten the
//!   iteration budget
//!
//! [`RansacEstimator`] wires the homography implementations of each.
//!
//! ## Modules
//!
//! - **[`api`](api)**: One-call helpers
//! - **[`core`](core)**: Core traits and the consensus loop
//! - **[`estimators`](estimators)**: The DLT homography solver
//! - **[`ransac`](ransac)**: Sequential and parallel RANSAC drivers
//! - **[`samplers`](samplers)**: Uniform sampling without replacement
//! - **[`scoring`](scoring)**: Inlier-count scoring
//! - **[`models`](models)**: The homography model type
//! - **[`settings`](settings)**: Configuration types
//! - **[`types`](types)**: Points and correspondences

pub mod api;
pub mod core;
pub mod error;
pub mod estimators;
pub mod models;
pub mod ransac;
pub mod samplers;
pub mod scoring;
pub mod settings;
pub mod types;
pub mod utils;

pub use api::{estimate_homography, ransac};
pub use core::{Estimator, Sampler, Scoring, TerminationCriterion};
pub use error::{EstimationError, Result};
pub use estimators::DltSolver;
pub use models::Homography;
pub use ransac::{RansacEstimator, RansacResult};
pub use settings::{DltSettings, RansacSettings};
pub use types::{CorrespondenceSet, Point2D, PointCorrespondence};
