//! Core shared types: points, correspondences and correspondence sets.
//!
//! A [`CorrespondenceSet`] is the only input the estimator reads. It is owned
//! by the caller and borrowed immutably for the duration of a run, so the same
//! set can be shared by several workers without copying.

use nalgebra::{DMatrix, Point2};
use serde::{Deserialize, Serialize};

use crate::error::{EstimationError, Result};

/// A 2D point with real coordinates.
pub type Point2D = Point2<f64>;

/// An ordered pair of points: `source` maps to `target`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointCorrespondence {
    pub source: Point2D,
    pub target: Point2D,
}

impl PointCorrespondence {
    pub fn new(source: Point2D, target: Point2D) -> Self {
        Self { source, target }
    }

    /// Build from raw coordinates `(x1, y1) -> (x2, y2)`.
    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point2D::new(x1, y1), Point2D::new(x2, y2))
    }

    /// Whether all four coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.source.coords.iter().chain(self.target.coords.iter()).all(|v| v.is_finite())
    }
}

/// Ordered, index-addressable sequence of correspondences.
///
/// Indices are stable for the lifetime of the set; RANSAC samples and inlier
/// masks refer to positions in this sequence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrespondenceSet {
    items: Vec<PointCorrespondence>,
}

impl CorrespondenceSet {
    pub fn new(items: Vec<PointCorrespondence>) -> Self {
        Self { items }
    }

    /// Pair up two equally long point lists.
    pub fn from_point_slices(sources: &[Point2D], targets: &[Point2D]) -> Result<Self> {
        if sources.len() != targets.len() {
            return Err(EstimationError::MismatchedInput(format!(
                "{} source points but {} target points",
                sources.len(),
                targets.len()
            )));
        }
        let items = sources
            .iter()
            .zip(targets)
            .map(|(s, t)| PointCorrespondence::new(*s, *t))
            .collect();
        Ok(Self { items })
    }

    /// Build from two `N x 2` matrices, one point per row.
    pub fn from_matrices(points1: &DMatrix<f64>, points2: &DMatrix<f64>) -> Result<Self> {
        if points1.nrows() != points2.nrows() {
            return Err(EstimationError::MismatchedInput(
                "points1 and points2 must have the same number of rows".to_string(),
            ));
        }
        if points1.ncols() != 2 || points2.ncols() != 2 {
            return Err(EstimationError::MismatchedInput(
                "points must be Nx2 matrices".to_string(),
            ));
        }

        let items = (0..points1.nrows())
            .map(|i| {
                PointCorrespondence::from_coords(
                    points1[(i, 0)],
                    points1[(i, 1)],
                    points2[(i, 0)],
                    points2[(i, 1)],
                )
            })
            .collect();
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PointCorrespondence> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointCorrespondence> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[PointCorrespondence] {
        &self.items
    }

    /// Copy out the correspondences at `indices`, in the order given.
    ///
    /// Returns `None` if any index is out of range.
    pub fn select(&self, indices: &[usize]) -> Option<Vec<PointCorrespondence>> {
        indices.iter().map(|&i| self.items.get(i).copied()).collect()
    }
}

impl From<Vec<PointCorrespondence>> for CorrespondenceSet {
    fn from(items: Vec<PointCorrespondence>) -> Self {
        Self::new(items)
    }
}

impl FromIterator<PointCorrespondence> for CorrespondenceSet {
    fn from_iter<I: IntoIterator<Item = PointCorrespondence>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl std::ops::Index<usize> for CorrespondenceSet {
    type Output = PointCorrespondence;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a CorrespondenceSet {
    type Item = &'a PointCorrespondence;
    type IntoIter = std::slice::Iter<'a, PointCorrespondence>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
