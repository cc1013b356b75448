//! RANSAC homography estimation.
//!
//! [`RansacEstimator`] repeatedly draws four correspondences, fits a
//! homography with the [`DltSolver`], counts the correspondences whose
//! transfer error is below the threshold and keeps the model with the most
//! inliers.
//!
//! Two entry points share the same loop:
//! - [`RansacEstimator::run`] takes any caller-owned random source;
//! - [`RansacEstimator::run_parallel`] splits the iteration budget across
//!   rayon workers, each driven by its own ChaCha stream derived from one
//!   seed, and folds the per-worker results in worker order.

use log::{debug, warn};
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::core::{
    consensus, ConsensusOutcome, Estimator, FixedIterations, RansacTerminationCriterion, Scoring,
    TerminationCriterion,
};
use crate::error::{EstimationError, Result};
use crate::estimators::{DltSolver, MINIMAL_SAMPLE_SIZE};
use crate::models::Homography;
use crate::samplers::UniformRandomSampler;
use crate::scoring::InlierCountScoring;
use crate::settings::RansacSettings;
use crate::types::CorrespondenceSet;

/// Result of one RANSAC run.
#[derive(Debug, Clone, PartialEq)]
pub struct RansacResult {
    /// Best homography found. `None` only if every non-degenerate candidate
    /// had zero inliers.
    pub homography: Option<Homography>,
    pub inlier_count: usize,
    /// Indices into the correspondence set, ascending.
    pub inliers: Vec<usize>,
    /// Trials executed.
    pub iterations: usize,
    /// Trials discarded because the sample was degenerate.
    pub degenerate_iterations: usize,
    /// Index of the trial that produced the best model. In a parallel run
    /// trials are numbered worker by worker.
    pub best_iteration: Option<usize>,
    /// Whether the final model was refit on its inliers.
    pub refined: bool,
}

impl RansacResult {
    pub fn is_inlier(&self, index: usize) -> bool {
        self.inliers.binary_search(&index).is_ok()
    }

    /// Dense boolean mask over a set of `len` correspondences.
    pub fn inlier_mask(&self, len: usize) -> Vec<bool> {
        let mut mask = vec![false; len];
        for &i in self.inliers.iter().filter(|&&i| i < len) {
            mask[i] = true;
        }
        mask
    }

    pub fn inlier_ratio(&self, len: usize) -> f64 {
        if len == 0 {
            0.0
        } else {
            self.inlier_count as f64 / len as f64
        }
    }
}

/// Robust homography estimator.
#[derive(Debug, Clone)]
pub struct RansacEstimator {
    settings: RansacSettings,
    solver: DltSolver,
}

impl RansacEstimator {
    /// Validate `settings` and build an estimator.
    pub fn new(settings: RansacSettings) -> Result<Self> {
        settings.validate()?;
        let solver = DltSolver::with_settings(settings.dlt);
        Ok(Self { settings, solver })
    }

    pub fn settings(&self) -> &RansacSettings {
        &self.settings
    }

    pub fn solver(&self) -> &DltSolver {
        &self.solver
    }

    /// Estimate the best homography using `rng` to draw samples.
    ///
    /// Fails with [`EstimationError::InsufficientCorrespondences`] before any
    /// trial if fewer than four correspondences are given, and with
    /// [`EstimationError::NoModelFound`] if every trial was degenerate.
    pub fn run<R: RngCore + ?Sized>(
        &self,
        correspondences: &CorrespondenceSet,
        rng: &mut R,
    ) -> Result<RansacResult> {
        check_len(correspondences)?;

        let mut sampler = UniformRandomSampler::new(rng);
        let outcome = self.run_trials(correspondences, &mut sampler, self.settings.max_iterations)?;
        self.finish(correspondences, Merged::from_single(outcome))
    }

    /// Parallel variant of [`run`](Self::run).
    ///
    /// The budget is split across `settings.workers` workers (rayon's pool
    /// size when unset); the first `max_iterations % workers` workers run one
    /// extra trial. Worker `w` samples from `ChaCha8Rng::seed_from_u64(seed)`
    /// on stream `w`. Results are folded in worker order with the same
    /// strictly-greater rule as the sequential loop, so the outcome only
    /// depends on the seed and the worker count.
    pub fn run_parallel(
        &self,
        correspondences: &CorrespondenceSet,
        seed: u64,
    ) -> Result<RansacResult> {
        check_len(correspondences)?;

        let workers = self
            .settings
            .workers
            .unwrap_or_else(rayon::current_num_threads)
            .clamp(1, self.settings.max_iterations);
        let budgets = split_budget(self.settings.max_iterations, workers);
        debug!("running {} trials on {workers} workers", self.settings.max_iterations);

        let outcomes: Vec<Result<ConsensusOutcome<Homography>>> = budgets
            .par_iter()
            .enumerate()
            .map(|(worker, &budget)| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(worker as u64);
                let mut sampler = UniformRandomSampler::new(rng);
                self.run_trials(correspondences, &mut sampler, budget)
            })
            .collect();

        let mut merged = Merged::default();
        for outcome in outcomes {
            merged.absorb(outcome?);
        }
        self.finish(correspondences, merged)
    }

    fn run_trials<R: RngCore>(
        &self,
        data: &CorrespondenceSet,
        sampler: &mut UniformRandomSampler<R>,
        budget: usize,
    ) -> Result<ConsensusOutcome<Homography>> {
        let scoring = InlierCountScoring::transfer_error(self.settings.inlier_threshold);
        match self.settings.confidence {
            Some(confidence) => {
                let mut termination =
                    RansacTerminationCriterion::new(confidence, self.settings.min_iterations);
                self.consensus_with(data, sampler, &scoring, &mut termination, budget)
            }
            None => self.consensus_with(data, sampler, &scoring, &mut FixedIterations, budget),
        }
    }

    fn consensus_with<R: RngCore, T: TerminationCriterion>(
        &self,
        data: &CorrespondenceSet,
        sampler: &mut UniformRandomSampler<R>,
        scoring: &InlierCountScoring<Homography>,
        termination: &mut T,
        budget: usize,
    ) -> Result<ConsensusOutcome<Homography>> {
        consensus(data, &self.solver, sampler, scoring, termination, budget)
    }

    fn finish(&self, data: &CorrespondenceSet, merged: Merged) -> Result<RansacResult> {
        if merged.iterations > 0 && merged.degenerate_iterations == merged.iterations {
            warn!("no model found: all {} trials were degenerate", merged.iterations);
            return Err(EstimationError::NoModelFound {
                iterations: merged.iterations,
            });
        }

        let mut result = RansacResult {
            inlier_count: merged.inliers.len(),
            homography: merged.model,
            inliers: merged.inliers,
            iterations: merged.iterations,
            degenerate_iterations: merged.degenerate_iterations,
            best_iteration: merged.best_iteration,
            refined: false,
        };

        if self.settings.refine_on_inliers {
            self.refine(data, &mut result);
        }

        debug!(
            "{} inliers of {} after {} trials ({} degenerate)",
            result.inlier_count,
            data.len(),
            result.iterations,
            result.degenerate_iterations
        );
        Ok(result)
    }

    /// Refit the best model on all of its inliers and keep the refit when it
    /// does not lose inliers.
    fn refine(&self, data: &CorrespondenceSet, result: &mut RansacResult) {
        if result.homography.is_none() || result.inlier_count <= MINIMAL_SAMPLE_SIZE {
            return;
        }
        let refit = match self.solver.estimate_model_nonminimal(data, &result.inliers) {
            Ok(h) => h,
            Err(e) => {
                debug!("refit on {} inliers failed: {e}", result.inlier_count);
                return;
            }
        };

        let scoring = InlierCountScoring::transfer_error(self.settings.inlier_threshold);
        let mut inliers = Vec::with_capacity(data.len());
        let score = scoring.score(data, &refit, &mut inliers);
        if score.inlier_count >= result.inlier_count {
            debug!("refit kept: {} -> {} inliers", result.inlier_count, score.inlier_count);
            result.homography = Some(refit);
            result.inlier_count = score.inlier_count;
            result.inliers = inliers;
            result.refined = true;
        }
    }
}

fn check_len(correspondences: &CorrespondenceSet) -> Result<()> {
    if correspondences.len() < MINIMAL_SAMPLE_SIZE {
        return Err(EstimationError::InsufficientCorrespondences {
            found: correspondences.len(),
        });
    }
    Ok(())
}

/// Split `total` trials over `workers`, earlier workers taking the remainder.
fn split_budget(total: usize, workers: usize) -> Vec<usize> {
    let base = total / workers;
    let extra = total % workers;
    (0..workers).map(|w| base + usize::from(w < extra)).collect()
}

/// Running reduction over per-worker outcomes.
#[derive(Default)]
struct Merged {
    model: Option<Homography>,
    inliers: Vec<usize>,
    best_iteration: Option<usize>,
    iterations: usize,
    degenerate_iterations: usize,
}

impl Merged {
    fn from_single(outcome: ConsensusOutcome<Homography>) -> Self {
        let mut merged = Self::default();
        merged.absorb(outcome);
        merged
    }

    /// Fold in the next outcome. Trial numbers continue from the trials
    /// already absorbed, and ties keep the earlier model.
    fn absorb(&mut self, outcome: ConsensusOutcome<Homography>) {
        let offset = self.iterations;
        self.iterations += outcome.iterations;
        self.degenerate_iterations += outcome.degenerate_iterations;

        if let Some(model) = outcome.best_model {
            if outcome.best_inliers.len() > self.inliers.len() {
                self.model = Some(model);
                self.inliers = outcome.best_inliers;
                self.best_iteration = outcome.best_iteration.map(|i| i + offset);
            }
        }
    }
}
