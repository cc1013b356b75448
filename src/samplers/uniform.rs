//! Uniform random sampler drawing minimal samples without replacement.

use rand::{Rng, RngCore};

use crate::core::Sampler;

/// Uniform random sampler drawing minimal samples without replacement.
///
/// The sampler owns no randomness of its own: it wraps a caller-provided
/// generator (or a mutable borrow of one), so seeding it fixes the whole
/// sample sequence.
pub struct UniformRandomSampler<R> {
    rng: R,
}

impl<R: RngCore> UniformRandomSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: RngCore> Sampler for UniformRandomSampler<R> {
    fn sample(&mut self, population: usize, out_indices: &mut [usize]) -> bool {
        let k = out_indices.len();
        if k == 0 || k > population {
            return false;
        }

        // Rejection sampling; cheap for the small sample sizes of minimal
        // solvers.
        for i in 0..k {
            loop {
                let candidate = self.rng.random_range(0..population);
                if out_indices[..i].iter().all(|&v| v != candidate) {
                    out_indices[i] = candidate;
                    break;
                }
            }
        }
        true
    }
}
