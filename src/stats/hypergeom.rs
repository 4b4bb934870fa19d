//! Hypergeometric tail and point probabilities
//!
//! Thin wrappers around the [`statrs`] hypergeometric distribution with
//! the parametrization used throughout the enrichment strategies: an urn
//! of `population` balls of which `successes` are white, `draws` balls
//! drawn without replacement.
use statrs::distribution::{Discrete, DiscreteCDF, Hypergeometric};

use crate::stats::PValue;

/// The probability of observing `observed` or more successes
///
/// This is the raw p-value of a single over-representation test.
/// Degenerate parameters (more successes or draws than the population
/// holds) violate the counting invariants of the callers and are treated
/// as programming errors.
pub fn upper_tail(population: usize, successes: usize, draws: usize, observed: usize) -> f64 {
    if observed == 0 {
        return 1.0;
    }
    let dist = Hypergeometric::new(population as u64, successes as u64, draws as u64)
        .expect("successes and draws must not exceed the population");

    // sf calculates "more than observed", subtracting one includes
    // the observed count itself
    dist.sf(observed as u64 - 1)
}

/// The probability of observing exactly `x` successes
pub fn point_probability(x: usize, population: usize, successes: usize, draws: usize) -> f64 {
    let dist = Hypergeometric::new(population as u64, successes as u64, draws as u64)
        .expect("successes and draws must not exceed the population");
    dist.pmf(x as u64)
}

/// The upper-tail test packaged as a [`PValue`]
///
/// `p_min` is the point probability of the most extreme outcome, i.e.
/// all `successes` genes drawn at once.
pub fn test_overrepresentation(
    population: usize,
    successes: usize,
    draws: usize,
    observed: usize,
) -> PValue {
    if observed == 0 {
        return PValue::ignored();
    }
    PValue::new(
        upper_tail(population, successes, draws, observed),
        point_probability(successes, population, successes, successes),
    )
}
