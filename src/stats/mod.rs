//! Statistical primitives shared by the p-value strategies and the
//! multiple testing corrections
pub mod hypergeom;

/// The significance values of a single term
///
/// `p_min` is the smallest p-value attainable given the term's counts and
/// is used by corrections that account for the discreteness of the test.
/// Terms flagged with `ignore_at_mtc` are degenerate (no study
/// annotations, or indistinguishable from their parents) and are excluded
/// from the correction's effective sample while still being reported with
/// `p = 1`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PValue {
    pub p: f64,
    pub p_adjusted: f64,
    pub p_min: f64,
    pub ignore_at_mtc: bool,
}

impl PValue {
    /// Constructs a regular p-value, not yet adjusted
    pub fn new(p: f64, p_min: f64) -> Self {
        Self {
            p,
            p_adjusted: p,
            p_min,
            ignore_at_mtc: false,
        }
    }

    /// Constructs a degenerate entry that is skipped by corrections
    pub fn ignored() -> Self {
        Self {
            p: 1.0,
            p_adjusted: 1.0,
            p_min: 1.0,
            ignore_at_mtc: true,
        }
    }
}

impl PartialOrd for PValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.p.partial_cmp(&other.p)
    }
}

/// The coupling point between a p-value strategy and a multiple testing
/// correction
///
/// A correction consumes the strategy exclusively through this interface:
/// the real result once, and - for resampling based corrections - the
/// same strategy recomputed on freshly sampled study sets of identical
/// size. Both calls must return index-aligned arrays over the same term
/// universe.
pub trait PValueSource {
    /// Calculates the p-values of the observed study set
    fn raw_pvalues(&mut self) -> Vec<PValue>;

    /// Calculates the p-values of a freshly sampled random study set
    /// of the same size as the observed one
    fn random_trial_pvalues(&mut self) -> Vec<PValue>;

    /// The size of the observed study set
    fn current_study_size(&self) -> usize;

    /// The number of p-values each calculation produces
    fn n_pvalues(&self) -> usize;
}

/// The number of entries that take part in the correction
pub fn relevant_count(pvalues: &[PValue]) -> usize {
    pvalues.iter().filter(|pval| !pval.ignore_at_mtc).count()
}

/// Indices of all non-ignored entries, sorted by ascending raw p-value
pub(crate) fn sorted_relevant_indices(pvalues: &[PValue]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..pvalues.len())
        .filter(|idx| !pvalues[*idx].ignore_at_mtc)
        .collect();
    indices.sort_by(|a, b| pvalues[*a].p.total_cmp(&pvalues[*b].p));
    indices
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ignored_entries_report_one() {
        let pval = PValue::ignored();
        assert!(pval.ignore_at_mtc);
        assert!((pval.p - 1.0).abs() < f64::EPSILON);
        assert!((pval.p_adjusted - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn relevant_indices_are_sorted_and_filtered() {
        let pvalues = vec![
            PValue::new(0.8, 0.01),
            PValue::ignored(),
            PValue::new(0.05, 0.01),
            PValue::new(0.3, 0.01),
        ];
        assert_eq!(relevant_count(&pvalues), 3);
        assert_eq!(sorted_relevant_indices(&pvalues), vec![2, 3, 0]);
    }
}
