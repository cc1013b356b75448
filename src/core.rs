//! Core traits and the consensus loop.
//!
//! A RANSAC run is assembled from four pieces:
//! - an [`Estimator`] that fits a model to a minimal sample,
//! - a [`Sampler`] that draws the sample indices,
//! - a [`Scoring`] strategy that counts inliers,
//! - a [`TerminationCriterion`] that may shorten the iteration budget.
//!
//! [`consensus`] drives them. It is shared by the sequential and the parallel
//! entry points of [`RansacEstimator`](crate::RansacEstimator).

use log::{debug, trace};

use crate::error::{EstimationError, Result};
use crate::scoring::Score;
use crate::types::CorrespondenceSet;

/// Estimator responsible for generating model hypotheses from samples.
pub trait Estimator {
    /// Model type produced by this estimator.
    type Model: Clone;

    /// Size of a minimal sample for this estimator.
    fn sample_size(&self) -> usize;

    /// Check whether the sample indices are usable (right size, distinct,
    /// in range).
    fn is_valid_sample(&self, data: &CorrespondenceSet, sample: &[usize]) -> bool;

    /// Estimate a model from a minimal sample.
    ///
    /// Degenerate samples fail with
    /// [`EstimationError::DegenerateConfiguration`].
    fn estimate_model(&self, data: &CorrespondenceSet, sample: &[usize]) -> Result<Self::Model>;

    /// Estimate a model from more than the minimal number of points.
    fn estimate_model_nonminimal(
        &self,
        data: &CorrespondenceSet,
        sample: &[usize],
    ) -> Result<Self::Model>;
}

/// Sampler responsible for drawing minimal samples.
pub trait Sampler {
    /// Draw `out_indices.len()` distinct indices from `[0, population)`.
    ///
    /// Returns `false` if no such sample exists.
    fn sample(&mut self, population: usize, out_indices: &mut [usize]) -> bool;
}

/// Scoring strategy used to evaluate model quality and determine inliers.
pub trait Scoring<M> {
    /// Inlier/outlier threshold for residuals.
    fn threshold(&self) -> f64;

    /// Score a model, writing the inlier indices into `inliers_out` in
    /// ascending order.
    fn score(&self, data: &CorrespondenceSet, model: &M, inliers_out: &mut Vec<usize>) -> Score;
}

/// Termination criterion deciding when the RANSAC loop can stop.
pub trait TerminationCriterion {
    /// Called after every improvement of the best model.
    ///
    /// May lower `max_iterations`. Returns `true` if the loop should stop
    /// immediately.
    fn check(
        &mut self,
        data_len: usize,
        best_score: &Score,
        sample_size: usize,
        max_iterations: &mut usize,
    ) -> bool;
}

/// Keeps the iteration budget unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedIterations;

impl TerminationCriterion for FixedIterations {
    fn check(&mut self, _: usize, _: &Score, _: usize, _: &mut usize) -> bool {
        false
    }
}

/// Standard RANSAC stopping rule.
///
/// Lowers the iteration budget to
/// `N = log(1 - confidence) / log(1 - inlier_ratio^sample_size)`,
/// never below `min_iterations`.
#[derive(Debug, Clone, Copy)]
pub struct RansacTerminationCriterion {
    /// Desired confidence in (0, 1).
    pub confidence: f64,
    pub min_iterations: usize,
}

impl RansacTerminationCriterion {
    pub fn new(confidence: f64, min_iterations: usize) -> Self {
        Self {
            confidence,
            min_iterations,
        }
    }
}

/// Number of trials needed to draw at least one all-inlier sample with the
/// given confidence, or `None` when the formula is undefined.
pub fn required_iterations(
    confidence: f64,
    inlier_ratio: f64,
    sample_size: usize,
) -> Option<usize> {
    let inlier_ratio = inlier_ratio.clamp(0.0, 1.0);
    if inlier_ratio <= 0.0 {
        return None;
    }
    if inlier_ratio >= 1.0 {
        return Some(1);
    }

    let p_good_sample = inlier_ratio.powi(sample_size as i32);
    if p_good_sample <= 0.0 || p_good_sample >= 1.0 {
        return None;
    }

    let log_one_minus_conf = (1.0 - confidence).ln();
    let log_one_minus_p = (1.0 - p_good_sample).ln();
    if !log_one_minus_conf.is_finite() || !log_one_minus_p.is_finite() || log_one_minus_p >= 0.0 {
        return None;
    }

    Some((log_one_minus_conf / log_one_minus_p).ceil().max(1.0) as usize)
}

impl TerminationCriterion for RansacTerminationCriterion {
    fn check(
        &mut self,
        data_len: usize,
        best_score: &Score,
        sample_size: usize,
        max_iterations: &mut usize,
    ) -> bool {
        if data_len == 0 {
            return false;
        }
        let ratio = best_score.inlier_count as f64 / data_len as f64;
        if let Some(required) = required_iterations(self.confidence, ratio, sample_size) {
            let required = required.max(self.min_iterations);
            if required < *max_iterations {
                debug!("confidence {} reached after {required} trials", self.confidence);
                *max_iterations = required;
            }
        }

        // The outer loop stops once the (possibly lowered) budget runs out.
        false
    }
}

/// Best model found by one consensus loop, plus bookkeeping.
#[derive(Debug, Clone)]
pub struct ConsensusOutcome<M> {
    pub best_model: Option<M>,
    pub best_inliers: Vec<usize>,
    pub best_score: Score,
    /// Loop-local index of the trial that produced `best_model`.
    pub best_iteration: Option<usize>,
    /// Trials executed.
    pub iterations: usize,
    /// Trials discarded because the sample was degenerate.
    pub degenerate_iterations: usize,
}

impl<M> ConsensusOutcome<M> {
    fn empty() -> Self {
        Self {
            best_model: None,
            best_inliers: Vec::new(),
            best_score: Score::default(),
            best_iteration: None,
            iterations: 0,
            degenerate_iterations: 0,
        }
    }
}

/// Run up to `max_iterations` sample / fit / score trials.
///
/// A candidate replaces the incumbent only when its score is strictly
/// greater, so among equal scores the earliest trial wins. The initial
/// incumbent is "no model, zero inliers". Degenerate samples are counted and
/// skipped; any other estimator error aborts the loop.
pub fn consensus<E, Sa, Sc, T>(
    data: &CorrespondenceSet,
    estimator: &E,
    sampler: &mut Sa,
    scoring: &Sc,
    termination: &mut T,
    max_iterations: usize,
) -> Result<ConsensusOutcome<E::Model>>
where
    E: Estimator,
    Sa: Sampler,
    Sc: Scoring<E::Model>,
    T: TerminationCriterion,
{
    let sample_size = estimator.sample_size();
    let mut sample = vec![0usize; sample_size];
    let mut tmp_inliers = Vec::with_capacity(data.len());
    let mut out = ConsensusOutcome::empty();
    let mut max_iterations = max_iterations;

    while out.iterations < max_iterations {
        let iteration = out.iterations;
        out.iterations += 1;

        if !sampler.sample(data.len(), &mut sample) {
            return Err(EstimationError::InsufficientCorrespondences { found: data.len() });
        }

        let model = match estimator.estimate_model(data, &sample) {
            Ok(model) => model,
            Err(EstimationError::DegenerateConfiguration(reason)) => {
                trace!("trial {iteration}: sample {sample:?} discarded ({reason})");
                out.degenerate_iterations += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let score = scoring.score(data, &model, &mut tmp_inliers);
        if score > out.best_score {
            debug!(
                "trial {iteration}: new best with {} inliers at threshold {} (was {})",
                score.inlier_count,
                scoring.threshold(),
                out.best_score.inlier_count
            );
            out.best_score = score;
            out.best_model = Some(model);
            out.best_iteration = Some(iteration);
            std::mem::swap(&mut out.best_inliers, &mut tmp_inliers);

            if termination.check(data.len(), &out.best_score, sample_size, &mut max_iterations) {
                break;
            }
        }
    }

    Ok(out)
}
