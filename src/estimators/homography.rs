//! Homography estimator using the 4-point Direct Linear Transform.

use nalgebra::{DMatrix, Matrix3};

use crate::core::Estimator;
use crate::error::{EstimationError, Result};
use crate::models::Homography;
use crate::settings::DltSettings;
use crate::types::{CorrespondenceSet, Point2D, PointCorrespondence};
use crate::utils::{has_collinear_triple, normalize_points};

/// Number of correspondences in a minimal sample.
pub const MINIMAL_SAMPLE_SIZE: usize = 4;

/// Closed-form homography solver.
///
/// Every correspondence `(x1, y1) -> (x2, y2)` contributes two rows to the
/// homogeneous system `A h = 0`:
///
/// ```text
/// [-x1, -y1, -1,   0,   0,  0, x1*x2, y1*x2, x2]
/// [  0,   0,  0, -x1, -y1, -1, x1*y2, y1*y2, y2]
/// ```
///
/// `h` is the right singular vector of the smallest singular value, reshaped
/// row-major into a 3x3 matrix. The returned homography is only defined up
/// to scale.
#[derive(Debug, Clone, Default)]
pub struct DltSolver {
    settings: DltSettings,
}

impl DltSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: DltSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DltSettings {
        &self.settings
    }

    /// Estimate the homography mapping exactly four sources onto their targets.
    ///
    /// Fails with [`EstimationError::DegenerateConfiguration`] when three of
    /// the source (or target) points are collinear, when the two smallest
    /// singular values of the coefficient matrix are not well separated, or
    /// when the solution is singular.
    pub fn estimate(&self, correspondences: &[PointCorrespondence]) -> Result<Homography> {
        if correspondences.len() != MINIMAL_SAMPLE_SIZE {
            return Err(EstimationError::DegenerateConfiguration(
                "sample must hold exactly four correspondences",
            ));
        }
        if correspondences.iter().any(|c| !c.is_finite()) {
            return Err(EstimationError::DegenerateConfiguration(
                "non-finite coordinates in sample",
            ));
        }

        let (sources, targets) = split(correspondences);
        let tol = self.settings.collinearity_tolerance;
        if has_collinear_triple(&sources, tol) {
            return Err(EstimationError::DegenerateConfiguration(
                "three source points are collinear",
            ));
        }
        if has_collinear_triple(&targets, tol) {
            return Err(EstimationError::DegenerateConfiguration(
                "three target points are collinear",
            ));
        }

        self.solve(&sources, &targets, true)
    }

    /// Least-squares DLT over four or more correspondences.
    ///
    /// Used to refit a model on its full inlier set. No collinearity or
    /// separation test is applied; only rank deficiency and a singular
    /// result are rejected.
    pub fn estimate_nonminimal(
        &self,
        correspondences: &[PointCorrespondence],
    ) -> Result<Homography> {
        let n = correspondences.len();
        if n < MINIMAL_SAMPLE_SIZE {
            return Err(EstimationError::InsufficientCorrespondences { found: n });
        }
        if correspondences.iter().any(|c| !c.is_finite()) {
            return Err(EstimationError::DegenerateConfiguration(
                "non-finite coordinates in sample",
            ));
        }

        let (sources, targets) = split(correspondences);
        self.solve(&sources, &targets, false)
    }

    fn solve(&self, sources: &[Point2D], targets: &[Point2D], minimal: bool) -> Result<Homography> {
        if !self.settings.normalize {
            let h = self.solve_raw(sources, targets, minimal)?;
            return finish(h);
        }

        let degenerate =
            || EstimationError::DegenerateConfiguration("points coincide, cannot normalize");
        let (src_n, t1) = normalize_points(sources).ok_or_else(degenerate)?;
        let (dst_n, t2) = normalize_points(targets).ok_or_else(degenerate)?;
        let t2_inv = t2.try_inverse().ok_or_else(degenerate)?;

        // H = T2^-1 * Hn * T1
        let hn = self.solve_raw(&src_n, &dst_n, minimal)?;
        finish(t2_inv * hn * t1)
    }

    fn solve_raw(
        &self,
        sources: &[Point2D],
        targets: &[Point2D],
        minimal: bool,
    ) -> Result<Matrix3<f64>> {
        let n = sources.len();

        // A thin SVD of a 2N x 9 matrix with 2N < 9 only yields 2N right
        // singular vectors; zero rows pad it square without changing A^T A.
        let rows = (2 * n).max(9);
        let mut a = DMatrix::<f64>::zeros(rows, 9);
        for (i, (p1, p2)) in sources.iter().zip(targets).enumerate() {
            let (x1, y1) = (p1.x, p1.y);
            let (x2, y2) = (p2.x, p2.y);

            // Row 2*i
            a[(2 * i, 0)] = -x1;
            a[(2 * i, 1)] = -y1;
            a[(2 * i, 2)] = -1.0;
            a[(2 * i, 6)] = x1 * x2;
            a[(2 * i, 7)] = y1 * x2;
            a[(2 * i, 8)] = x2;

            // Row 2*i + 1
            a[(2 * i + 1, 3)] = -x1;
            a[(2 * i + 1, 4)] = -y1;
            a[(2 * i + 1, 5)] = -1.0;
            a[(2 * i + 1, 6)] = x1 * y2;
            a[(2 * i + 1, 7)] = y1 * y2;
            a[(2 * i + 1, 8)] = y2;
        }

        let svd = a.svd(false, true);
        let v_t = svd
            .v_t
            .ok_or(EstimationError::DegenerateConfiguration("SVD did not produce V^T"))?;
        let smallest = self.null_vector_index(svd.singular_values.as_slice(), minimal)?;

        let h = v_t.row(smallest);
        let mut h_mat = Matrix3::<f64>::zeros();
        for r in 0..3 {
            for c in 0..3 {
                h_mat[(r, c)] = h[3 * r + c];
            }
        }
        Ok(h_mat)
    }

    /// Index of the singular value whose right singular vector solves the
    /// system.
    ///
    /// Rejects a zero or non-finite matrix, a second-smallest singular value
    /// that is negligible next to the largest (null space of dimension two or
    /// more), and for minimal samples two smallest values that are not well
    /// separated.
    fn null_vector_index(&self, sv: &[f64], minimal: bool) -> Result<usize> {
        // nalgebra does not promise an ordering, so locate the two smallest.
        let mut order: Vec<usize> = (0..sv.len()).collect();
        order.sort_by(|&i, &j| sv[i].total_cmp(&sv[j]));
        let (smallest, second) = (order[0], order[1]);
        let largest = sv[order[order.len() - 1]];

        if !(largest.is_finite() && largest > 0.0) {
            return Err(EstimationError::DegenerateConfiguration(
                "coefficient matrix is zero or non-finite",
            ));
        }
        if sv[second] <= self.settings.rank_tolerance * largest {
            return Err(EstimationError::DegenerateConfiguration(
                "coefficient matrix is rank deficient",
            ));
        }
        if minimal && sv[smallest] >= (1.0 - self.settings.separation_tolerance) * sv[second] {
            return Err(EstimationError::DegenerateConfiguration(
                "smallest singular values are not separated",
            ));
        }
        Ok(smallest)
    }
}

fn split(correspondences: &[PointCorrespondence]) -> (Vec<Point2D>, Vec<Point2D>) {
    correspondences.iter().map(|c| (c.source, c.target)).unzip()
}

fn finish(h: Matrix3<f64>) -> Result<Homography> {
    let homography = Homography::new(h);
    if homography.is_singular() {
        return Err(EstimationError::DegenerateConfiguration("estimated homography is singular"));
    }
    Ok(homography)
}

impl Estimator for DltSolver {
    type Model = Homography;

    fn sample_size(&self) -> usize {
        MINIMAL_SAMPLE_SIZE
    }

    fn is_valid_sample(&self, data: &CorrespondenceSet, sample: &[usize]) -> bool {
        if sample.len() != self.sample_size() || sample.iter().any(|&i| i >= data.len()) {
            return false;
        }
        // Ensure all indices are distinct.
        for i in 0..sample.len() {
            for j in (i + 1)..sample.len() {
                if sample[i] == sample[j] {
                    return false;
                }
            }
        }
        true
    }

    fn estimate_model(&self, data: &CorrespondenceSet, sample: &[usize]) -> Result<Homography> {
        if !self.is_valid_sample(data, sample) {
            return Err(EstimationError::DegenerateConfiguration("invalid sample indices"));
        }
        let picked = data
            .select(sample)
            .ok_or(EstimationError::DegenerateConfiguration("invalid sample indices"))?;
        self.estimate(&picked)
    }

    fn estimate_model_nonminimal(
        &self,
        data: &CorrespondenceSet,
        sample: &[usize],
    ) -> Result<Homography> {
        let picked = data
            .select(sample)
            .ok_or(EstimationError::DegenerateConfiguration("invalid sample indices"))?;
        self.estimate_nonminimal(&picked)
    }
}
