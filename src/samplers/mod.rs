//! Sampling strategies.
//!
//! Only uniform sampling without replacement is provided; other strategies
//! plug in through the [`Sampler`](crate::core::Sampler) trait.

pub mod uniform;

pub use uniform::UniformRandomSampler;
