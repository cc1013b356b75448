//! Planar projective transformation model.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::types::{Point2D, PointCorrespondence};

/// Ratio of smallest to largest singular value below which a homography is
/// treated as singular.
const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Planar projective transformation represented by a 3x3 matrix.
///
/// The matrix is only defined up to a non-zero scale factor; two homographies
/// that differ by scale describe the same mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Pure translation by `(tx, ty)`.
    pub fn from_translation(tx: f64, ty: f64) -> Self {
        Self::new(Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0))
    }

    /// Map a point through the homography with perspective division.
    ///
    /// Points that land on the line at infinity come back with non-finite
    /// coordinates.
    pub fn transform_point(&self, p: &Point2D) -> Point2D {
        let q = self.h * Vector3::new(p.x, p.y, 1.0);
        Point2D::new(q.x / q.z, q.y / q.z)
    }

    /// Euclidean distance between the transformed source and the target.
    ///
    /// Non-finite projections yield `f64::INFINITY`, so they never pass an
    /// inlier test.
    pub fn residual(&self, correspondence: &PointCorrespondence) -> f64 {
        let projected = self.transform_point(&correspondence.source);
        let d = (projected - correspondence.target).norm();
        if d.is_finite() { d } else { f64::INFINITY }
    }

    /// Copy scaled so that the bottom-right entry is 1.
    ///
    /// If that entry is (numerically) zero the matrix is instead scaled to
    /// unit Frobenius norm.
    pub fn normalized(&self) -> Self {
        let scale = self.h[(2, 2)];
        if scale.abs() > f64::EPSILON {
            return Self::new(self.h / scale);
        }
        let norm = self.h.norm();
        if norm > 0.0 {
            Self::new(self.h / norm)
        } else {
            self.clone()
        }
    }

    /// Whether the matrix is rank deficient or contains non-finite entries.
    pub fn is_singular(&self) -> bool {
        if self.h.iter().any(|v| !v.is_finite()) {
            return true;
        }
        // The condition number does not depend on the scale of H or on the
        // magnitude of its translation part.
        let sv = self.h.singular_values();
        let largest = sv.max();
        largest <= 0.0 || sv.min() <= SINGULARITY_TOLERANCE * largest
    }

    pub fn try_inverse(&self) -> Option<Self> {
        if self.is_singular() {
            return None;
        }
        self.h.try_inverse().map(Self::new)
    }
}
