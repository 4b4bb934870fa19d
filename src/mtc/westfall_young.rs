//! Westfall-Young single-step resampling corrections
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::mtc::{MultipleTestCorrection, Resampling, RunControl};
use crate::stats::{sorted_relevant_indices, PValue, PValueSource};
use crate::{EnrichmentError, Result, DEFAULT_RESAMPLING_STEPS, DEFAULT_SIZE_TOLERANCE};

/// Cache of sampled minimum p-values, keyed by study set size
///
/// Each entry holds the sorted minima of one resampling run. The cache
/// persists across calculation runs on the same correction instance so
/// repeated analyses with similar study sizes can skip the expensive
/// resampling. [`MinPCache::reset`] must be called between logically
/// independent analyses.
///
/// The lookup-or-resample sequence of the corrections runs under the
/// cache lock as a single critical section: two threads missing the
/// cache for the same size would otherwise both resample, and a reader
/// could observe a partially inserted entry.
#[derive(Debug, Default)]
pub struct MinPCache {
    entries: Mutex<HashMap<usize, Arc<[f64]>>>,
}

impl MinPCache {
    /// Constructs an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all cached samples
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// The number of cached study set sizes
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no samples are cached
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<usize, Arc<[f64]>>> {
        self.entries.lock().expect("min-p cache lock poisoned")
    }
}

/// The cached entry whose size is closest to `size`, as
/// `(cached size, sorted minima, size ratio >= 1)`
fn best_entry(
    entries: &HashMap<usize, Arc<[f64]>>,
    size: usize,
) -> Option<(usize, Arc<[f64]>, f64)> {
    let mut best: Option<(usize, Arc<[f64]>, f64)> = None;
    for (&cached_size, minima) in entries.iter() {
        let ratio = if cached_size >= size {
            cached_size as f64 / size as f64
        } else {
            size as f64 / cached_size as f64
        };
        if best.as_ref().map_or(true, |(_, _, best_ratio)| ratio < *best_ratio) {
            best = Some((cached_size, minima.clone(), ratio));
        }
    }
    best
}

/// Draws `steps` random trials and returns the sorted per-trial minima
///
/// The minimum is taken over the non-ignored entries of each trial. A
/// trial without any relevant p-value contributes 1.0. Cancellation is
/// polled once per trial and aborts without a partial result.
fn sample_minima(
    source: &mut dyn PValueSource,
    steps: usize,
    ctrl: &RunControl,
) -> Result<Vec<f64>> {
    ctrl.progress_init(steps);
    let mut minima = Vec::with_capacity(steps);
    for trial in 0..steps {
        ctrl.check_cancelled()?;
        let min = source
            .random_trial_pvalues()
            .iter()
            .filter(|pvalue| !pvalue.ignore_at_mtc)
            .map(|pvalue| pvalue.p)
            .fold(f64::INFINITY, f64::min);
        minima.push(if min.is_finite() { min } else { 1.0 });
        ctrl.progress_update(trial + 1);
    }
    minima.sort_by(f64::total_cmp);
    Ok(minima)
}

/// Sets `p_adjusted = |{minima <= p}| / steps` for every relevant entry
///
/// Entries are processed in ascending raw p-value order so a single
/// monotone pass over the sorted minima suffices.
fn apply_minima(pvalues: &mut [PValue], minima: &[f64], steps: usize) {
    let order = sorted_relevant_indices(pvalues);
    let mut considered = 0;
    for idx in order {
        while considered < minima.len() && minima[considered] <= pvalues[idx].p {
            considered += 1;
        }
        pvalues[idx].p_adjusted = considered as f64 / steps as f64;
    }
}

/// The exact Westfall-Young single-step correction
///
/// Controls the family-wise error rate: `B` random study sets of the
/// observed size are drawn, the minimum raw p-value of each trial forms
/// the empirical null distribution of the minimum statistic, and every
/// real p-value is adjusted to the fraction of trials with a smaller or
/// equal minimum. Samples are cached per exact study set size.
#[derive(Debug)]
pub struct WestfallYoung {
    steps: usize,
    cache: MinPCache,
}

impl WestfallYoung {
    /// Constructs the correction with the given number of trials
    ///
    /// # Errors
    ///
    /// [`EnrichmentError::InvalidResamplingSteps`] for a zero step count.
    pub fn new(steps: usize) -> Result<Self> {
        if steps == 0 {
            return Err(EnrichmentError::InvalidResamplingSteps(steps));
        }
        Ok(Self {
            steps,
            cache: MinPCache::new(),
        })
    }
}

impl Default for WestfallYoung {
    fn default() -> Self {
        Self {
            steps: DEFAULT_RESAMPLING_STEPS,
            cache: MinPCache::new(),
        }
    }
}

impl MultipleTestCorrection for WestfallYoung {
    fn name(&self) -> &'static str {
        "Westfall-Young-Single-Step"
    }

    fn description(&self) -> &'static str {
        "Family-wise error rate control by single-step resampling"
    }

    fn adjust(&self, source: &mut dyn PValueSource, ctrl: &RunControl) -> Result<Vec<PValue>> {
        let mut pvalues = source.raw_pvalues();
        let size = source.current_study_size();

        let minima: Arc<[f64]> = {
            let mut entries = self.cache.lock();
            match entries.get(&size) {
                Some(minima) => {
                    info!("using cached samples for study set size {size}");
                    minima.clone()
                }
                None => {
                    info!("sampling {} trials for study set size {size}", self.steps);
                    let minima: Arc<[f64]> = sample_minima(source, self.steps, ctrl)?.into();
                    entries.insert(size, minima.clone());
                    minima
                }
            }
        };

        apply_minima(&mut pvalues, &minima, self.steps);
        Ok(pvalues)
    }
}

impl Resampling for WestfallYoung {
    fn n_resampling_steps(&self) -> usize {
        self.steps
    }

    fn reset_cache(&self) {
        self.cache.reset();
    }
}

/// The size-tolerant approximate Westfall-Young correction
///
/// Identical to [`WestfallYoung`], except that cached samples of a
/// *similar* study set size are reused: if the closest cached size is
/// within the configured tolerance, its minima stand in for a fresh
/// resampling run. The approximation rests on the null distribution of
/// the minimum p-value varying slowly with the study set size.
#[derive(Debug)]
pub struct WestfallYoungApproximate {
    steps: usize,
    tolerance: f64,
    cache: MinPCache,
}

impl WestfallYoungApproximate {
    /// Constructs the correction with the given number of trials and
    /// size tolerance in percent
    ///
    /// # Errors
    ///
    /// [`EnrichmentError::InvalidResamplingSteps`] for a zero step
    /// count, [`EnrichmentError::InvalidSizeTolerance`] for a negative
    /// or non-finite tolerance.
    pub fn new(steps: usize, tolerance: f64) -> Result<Self> {
        if steps == 0 {
            return Err(EnrichmentError::InvalidResamplingSteps(steps));
        }
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(EnrichmentError::InvalidSizeTolerance(tolerance));
        }
        Ok(Self {
            steps,
            tolerance,
            cache: MinPCache::new(),
        })
    }

    /// The configured size tolerance in percent
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl Default for WestfallYoungApproximate {
    fn default() -> Self {
        Self {
            steps: DEFAULT_RESAMPLING_STEPS,
            tolerance: DEFAULT_SIZE_TOLERANCE,
            cache: MinPCache::new(),
        }
    }
}

impl MultipleTestCorrection for WestfallYoungApproximate {
    fn name(&self) -> &'static str {
        "Westfall-Young-Approximate"
    }

    fn description(&self) -> &'static str {
        "Single-step resampling, reusing cached samples of similar study set sizes"
    }

    fn adjust(&self, source: &mut dyn PValueSource, ctrl: &RunControl) -> Result<Vec<PValue>> {
        let mut pvalues = source.raw_pvalues();
        let size = source.current_study_size();
        let cutoff = 1.0 + 0.01 * self.tolerance;

        // lookup and possible insert form one critical section,
        // concurrent callers must not resample the same size twice
        let minima: Arc<[f64]> = {
            let mut entries = self.cache.lock();
            match best_entry(&entries, size) {
                Some((cached_size, minima, ratio)) if ratio <= cutoff => {
                    info!(
                        "needing samples for study set size {size}, \
                         using available samples for size {cached_size}"
                    );
                    minima
                }
                _ => {
                    info!("sampling {} trials for study set size {size}", self.steps);
                    let minima: Arc<[f64]> = sample_minima(source, self.steps, ctrl)?.into();
                    entries.insert(size, minima.clone());
                    minima
                }
            }
        };

        apply_minima(&mut pvalues, &minima, self.steps);
        Ok(pvalues)
    }
}

impl Resampling for WestfallYoungApproximate {
    fn n_resampling_steps(&self) -> usize {
        self.steps
    }

    fn reset_cache(&self) {
        self.cache.reset();
    }
}
