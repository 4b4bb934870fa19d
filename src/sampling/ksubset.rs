//! Sampling of k-subsets from a collection of objects
use std::collections::HashSet;
use std::f64::consts::LN_2;
use std::hash::Hash;

use rand::Rng;
use statrs::function::factorial::ln_factorial;

use crate::{EnrichmentError, Result};

/// Samples k-subsets from a fixed collection, without replacement
///
/// An individual sample is an ordered list of `k` distinct objects.
/// Sampling *many* subsets without replacement means the samples are
/// distinct as ordered lists, not necessarily as sets.
#[derive(Debug, Clone)]
pub struct KSubsetSampler<T> {
    objects: Vec<T>,
}

impl<T: Clone> KSubsetSampler<T> {
    /// Constructs a sampler over the given objects
    pub fn new<I: IntoIterator<Item = T>>(objects: I) -> Self {
        Self {
            objects: objects.into_iter().collect(),
        }
    }

    /// The number of objects available for sampling
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if there is nothing to sample from
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Draws one ordered k-subset in O(k) by a partial Fisher-Yates
    /// shuffle
    ///
    /// `k` is clamped to the collection size, asking for more than
    /// everything returns everything.
    pub fn sample_one_ordered<R: Rng>(&mut self, k: usize, rng: &mut R) -> Vec<T> {
        let n = self.objects.len();
        let k = k.min(n);
        if k == n {
            return self.objects.clone();
        }

        let mut sample = Vec::with_capacity(k);
        for i in ((n - k)..n).rev() {
            let choose = rng.gen_range(0..=i);
            self.objects.swap(choose, i);
            sample.push(self.objects[i].clone());
        }
        sample
    }
}

impl<T: Clone + Eq + Hash> KSubsetSampler<T> {
    /// Draws `n` ordered k-subsets that are pairwise distinct
    ///
    /// When the collision probability is low enough, distinctness is
    /// achieved by rejection sampling. The only other implemented case
    /// is `k == 1`, where a single larger sample is split into
    /// singletons.
    ///
    /// # Errors
    ///
    /// [`EnrichmentError::NotImplemented`] when the collision
    /// probability is too high and `k > 1`. Failing explicitly beats
    /// silently sampling with replacement.
    pub fn sample_many_ordered_without_replacement<R: Rng>(
        &mut self,
        k: usize,
        n: usize,
        rng: &mut R,
    ) -> Result<HashSet<Vec<T>>> {
        let mut samples = HashSet::new();
        if k == 0 {
            samples.insert(Vec::new());
            return Ok(samples);
        }

        let n_obj = self.objects.len() as u64;
        let k_clamped = (k as u64).min(n_obj);
        // expected number of collisions among n samples, in log space
        let log_reject = (n as f64).ln() - ln_factorial(n_obj) + ln_factorial(n_obj - k_clamped);

        if log_reject < -LN_2 {
            while samples.len() < n {
                samples.insert(self.sample_one_ordered(k, rng));
            }
        } else if k == 1 {
            for obj in self.sample_one_ordered(n, rng) {
                samples.insert(vec![obj]);
            }
        } else {
            return Err(EnrichmentError::NotImplemented);
        }

        Ok(samples)
    }
}
