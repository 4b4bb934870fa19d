//! Weighted sampling from two disjoint pools
use std::collections::HashSet;
use std::hash::Hash;

use rand::Rng;
use tracing::warn;

/// An urn holding a favored and a background pool of objects
///
/// Each draw picks the favored pool with probability
/// `favored · ratio / (favored · ratio + background)`, based on the
/// objects remaining in both pools, then removes a uniformly chosen
/// object from the selected pool. With `ratio > 1` the favored objects
/// are over-represented in the sample.
///
/// The pools must be disjoint. Overlaps are resolved at construction by
/// removing favored objects from the background pool, with a diagnostic
/// count of how many were dropped.
#[derive(Debug, Clone)]
pub struct WeightedUrn<T> {
    favored: Vec<T>,
    background: Vec<T>,
    ratio: f64,
}

impl<T: Clone + Eq + Hash> WeightedUrn<T> {
    /// Constructs an urn from the two pools
    pub fn new(favored: HashSet<T>, background: HashSet<T>, ratio: f64) -> Self {
        let mut disjoint_background = Vec::with_capacity(background.len());
        let mut removed = 0;
        for object in background {
            if favored.contains(&object) {
                removed += 1;
            } else {
                disjoint_background.push(object);
            }
        }
        if removed > 0 {
            warn!("removed {removed} background objects to keep the urn pools disjoint");
        }

        Self {
            favored: favored.into_iter().collect(),
            background: disjoint_background,
            ratio,
        }
    }

    /// The number of objects across both pools
    pub fn len(&self) -> usize {
        self.favored.len() + self.background.len()
    }

    /// Returns `true` if both pools are empty
    pub fn is_empty(&self) -> bool {
        self.favored.is_empty() && self.background.is_empty()
    }

    /// Draws `desired` objects without replacement
    ///
    /// Asking for more objects than the urn holds returns everything
    /// and emits an under-fill diagnostic instead of failing.
    pub fn sample<R: Rng>(&self, desired: usize, rng: &mut R) -> HashSet<T> {
        let mut favored = self.favored.clone();
        let mut background = self.background.clone();
        let mut sampled = HashSet::with_capacity(desired.min(self.len()));

        let mut remaining = desired;
        while remaining > 0 && (!favored.is_empty() || !background.is_empty()) {
            let take_favored = if background.is_empty() {
                true
            } else if favored.is_empty() {
                false
            } else {
                let weighted = favored.len() as f64 * self.ratio;
                rng.gen::<f64>() < weighted / (weighted + background.len() as f64)
            };

            let pool = if take_favored {
                &mut favored
            } else {
                &mut background
            };
            let choose = rng.gen_range(0..pool.len());
            sampled.insert(pool.swap_remove(choose));
            remaining -= 1;
        }

        if remaining > 0 {
            warn!(
                "tried to sample {desired} objects but only {} were available",
                sampled.len()
            );
        }
        sampled
    }
}
