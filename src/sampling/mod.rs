//! Randomized study set generation
//!
//! The resampling based corrections draw uniform random study sets from
//! the population through [`StudySetSampler`]. The same sampler can
//! produce study sets biased towards selected terms, which is how
//! benchmark data sets with a known ground truth are constructed.
//!
//! All samplers take the random number generator as an explicit
//! parameter, reproducible runs pass a seeded generator.
mod ksubset;
mod study;
mod urn;

pub use ksubset::KSubsetSampler;
pub use study::{PercentageEnrichmentRule, StudySetSampler};
pub use urn::WeightedUrn;
