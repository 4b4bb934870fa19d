//! The Storey q-value estimator
use tracing::debug;

use crate::mtc::{MultipleTestCorrection, RunControl};
use crate::stats::{sorted_relevant_indices, PValue, PValueSource};
use crate::Result;

/// Estimates the false discovery rate as q-values
///
/// Implements the procedure of Storey & Tibshirani, "Statistical
/// significance for genomewide studies": raw p-values are ranked
/// ascending (ties receive the average rank of their block) and
/// `q = π0 · m · p / rank`, made monotone by a running minimum from the
/// largest rank downwards.
///
/// The proportion of true null hypotheses `π0` is currently fixed at
/// 1.0, which makes the estimate conservative. The λ-sweep estimator is
/// evaluated and logged for diagnostics, but its result is not used yet.
#[derive(Debug, Default, Copy, Clone)]
pub struct Storey;

impl Storey {
    /// The λ-sweep estimate of the true-null proportion
    ///
    /// `sorted` must be ascending. The computed estimate is only logged,
    /// the returned value is the constant 1.0.
    fn estimate_pi0(sorted: &[f64]) -> f64 {
        let m = sorted.len();
        if m == 0 {
            return 1.0;
        }

        let mut lambda = 0.0;
        for _ in 0..96 {
            let over = m - sorted.partition_point(|p| *p <= lambda);
            let pi0 = over as f64 / (m as f64 * (1.0 - lambda));
            debug!("lambda = {lambda:.2}: {over} p-values above, pi0 = {pi0:.4}");
            lambda += 0.01;
        }

        1.0
    }
}

impl MultipleTestCorrection for Storey {
    fn name(&self) -> &'static str {
        "Storey-QValues"
    }

    fn description(&self) -> &'static str {
        "False discovery rate estimation via q-values"
    }

    fn adjust(&self, source: &mut dyn PValueSource, _ctrl: &RunControl) -> Result<Vec<PValue>> {
        let mut pvalues = source.raw_pvalues();
        let order = sorted_relevant_indices(&pvalues);
        let m = order.len();
        if m == 0 {
            return Ok(pvalues);
        }

        // average the ranks of tied blocks
        let mut rank = vec![0.0; pvalues.len()];
        let mut start = 0;
        while start < m {
            let value = pvalues[order[start]].p;
            let mut end = start + 1;
            let mut rank_sum = start as f64 + 1.0;
            while end < m && pvalues[order[end]].p == value {
                rank_sum += end as f64 + 1.0;
                end += 1;
            }
            let averaged = rank_sum / (end - start) as f64;
            for idx in &order[start..end] {
                rank[*idx] = averaged;
            }
            start = end;
        }

        let sorted: Vec<f64> = order.iter().map(|idx| pvalues[*idx].p).collect();
        let pi0 = Self::estimate_pi0(&sorted);

        for idx in &order {
            pvalues[*idx].p_adjusted = pi0 * m as f64 * pvalues[*idx].p / rank[*idx];
        }

        // enforce monotony from the largest rank down, clamping the top
        let last = order[m - 1];
        pvalues[last].p_adjusted = pvalues[last].p_adjusted.min(1.0);
        for pair in (0..m - 1).rev() {
            let next = pvalues[order[pair + 1]].p_adjusted;
            let entry = &mut pvalues[order[pair]].p_adjusted;
            *entry = (*entry).min(next);
        }

        Ok(pvalues)
    }
}
