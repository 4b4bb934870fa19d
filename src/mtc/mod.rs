//! Multiple testing corrections
//!
//! Every correction consumes a p-value strategy through the narrow
//! [`PValueSource`] interface and returns the same entries with their
//! `p_adjusted` field filled in. Entries flagged with
//! [`PValue::ignore_at_mtc`] never take part in a correction, they keep
//! their adjusted p-value of 1.
use core::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::stats::{PValue, PValueSource};
use crate::{EnrichmentError, Result};

mod storey;
mod westfall_young;

pub use storey::Storey;
pub use westfall_young::{MinPCache, WestfallYoung, WestfallYoungApproximate};

/// Advisory observer of resampling progress
///
/// Updates may be delivered from whichever thread runs the correction.
pub trait ResamplingProgress: Send + Sync {
    /// A resampling loop of `total` trials is about to start
    fn init(&self, total: usize);

    /// `current` trials out of the announced total have finished
    fn update(&self, current: usize);
}

/// Cooperative cancellation flag
///
/// Cloning the flag shares the underlying state, cancelling one clone
/// cancels all of them. Long running corrections poll the flag once per
/// trial and abort with [`EnrichmentError::Cancelled`].
#[derive(Debug, Default, Clone)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Constructs a new, uncancelled flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// Cancellation and progress wiring of a calculation run
#[derive(Default, Clone)]
pub struct RunControl {
    cancel: Option<CancelFlag>,
    progress: Option<Arc<dyn ResamplingProgress>>,
}

impl RunControl {
    /// Constructs a control handle without cancellation or progress
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a cancellation flag
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Attaches a progress observer
    pub fn with_progress(mut self, progress: Arc<dyn ResamplingProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(cancel) if cancel.is_cancelled() => Err(EnrichmentError::Cancelled),
            _ => Ok(()),
        }
    }

    pub(crate) fn progress_init(&self, total: usize) {
        if let Some(progress) = &self.progress {
            progress.init(total);
        }
    }

    pub(crate) fn progress_update(&self, current: usize) {
        if let Some(progress) = &self.progress {
            progress.update(current);
        }
    }
}

impl Debug for RunControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunControl")
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// A multiple testing correction procedure
///
/// `adjust` takes a mutable source because resampling corrections drive
/// its random trial generation. The returned array is index-aligned with
/// the raw p-values.
pub trait MultipleTestCorrection {
    /// Short name of the correction, reported in the result
    fn name(&self) -> &'static str;

    /// One-line description of the correction
    fn description(&self) -> &'static str;

    /// Computes adjusted p-values for the source's raw p-values
    ///
    /// # Errors
    ///
    /// [`EnrichmentError::Cancelled`] when a cancellation flag fires
    /// during resampling. No partially adjusted values are returned.
    fn adjust(&self, source: &mut dyn PValueSource, ctrl: &RunControl) -> Result<Vec<PValue>>;
}

/// Resampling based corrections expose their trial count and sample cache
pub trait Resampling {
    /// The number of random trials per resampling run
    fn n_resampling_steps(&self) -> usize;

    /// Drops all cached samples
    ///
    /// Must be called between logically independent analyses that share
    /// the correction instance.
    fn reset_cache(&self);
}

/// The straightforward case: no correction is performed
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCorrection;

impl MultipleTestCorrection for NoCorrection {
    fn name(&self) -> &'static str {
        "None"
    }

    fn description(&self) -> &'static str {
        "No correction is performed"
    }

    fn adjust(&self, source: &mut dyn PValueSource, _ctrl: &RunControl) -> Result<Vec<PValue>> {
        let mut pvalues = source.raw_pvalues();
        for pvalue in &mut pvalues {
            pvalue.p_adjusted = pvalue.p;
        }
        Ok(pvalues)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// A canned source for correction tests, counting random trials
    pub(crate) struct FixedSource {
        pub raw: Vec<PValue>,
        pub trial: Vec<PValue>,
        pub size: usize,
        pub trials_requested: usize,
    }

    impl FixedSource {
        pub fn new(raw: Vec<f64>, trial: Vec<f64>, size: usize) -> Self {
            Self {
                raw: raw.into_iter().map(|p| PValue::new(p, p)).collect(),
                trial: trial.into_iter().map(|p| PValue::new(p, p)).collect(),
                size,
                trials_requested: 0,
            }
        }
    }

    impl PValueSource for FixedSource {
        fn raw_pvalues(&mut self) -> Vec<PValue> {
            self.raw.clone()
        }

        fn random_trial_pvalues(&mut self) -> Vec<PValue> {
            self.trials_requested += 1;
            self.trial.clone()
        }

        fn current_study_size(&self) -> usize {
            self.size
        }

        fn n_pvalues(&self) -> usize {
            self.raw.len()
        }
    }

    #[test]
    fn no_correction_copies_p() {
        let mut source = FixedSource::new(vec![0.1, 0.7], vec![], 5);
        let adjusted = NoCorrection
            .adjust(&mut source, &RunControl::default())
            .unwrap();
        assert!((adjusted[0].p_adjusted - 0.1).abs() < f64::EPSILON);
        assert!((adjusted[1].p_adjusted - 0.7).abs() < f64::EPSILON);
        assert_eq!(source.trials_requested, 0);
    }

    #[test]
    fn cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }
}
