//! The greedy generative-model test
use tracing::debug;

use crate::annotations::AssociationContainer;
use crate::calculation::{CalcContext, PValueStrategy, StrategyDetail, TermPValue};
use crate::graph::OntologyGraph;
use crate::{GeneSet, PValue, StudySet};

/// Convergence threshold of the parameter re-estimation loop
const PARAM_EPSILON: f64 = 1e-4;

/// Selects a set of "active" terms under a generative model
///
/// The model assumes that study genes are generated by a small set of
/// active terms: a gene covered by an active term is in the study set
/// with probability `p`, an uncovered gene with the leak probability `q`.
/// The log-likelihood, penalized with `alpha` per active term, is
/// maximized by single-toggle hill climbing. Unless `p` and `q` are fixed
/// externally they are re-estimated from the maximizing state and the
/// optimization repeats until both converge.
///
/// The hill climbing restarts from the empty active set on every round
/// and only finds a local optimum. One full scan evaluates the objective
/// once per term, so a round costs O(terms²) objective updates in the
/// worst case.
///
/// After convergence a conventional independent test provides the
/// reported p-values, but the active-set membership is the real signal:
/// every term outside the final active set is overwritten with `p = 1`
/// and flagged as ignored.
#[derive(Debug, Copy, Clone)]
pub struct Generative {
    p: Option<f64>,
    q: Option<f64>,
    alpha: f64,
}

impl Generative {
    /// Constructs the model with free parameters and the default
    /// per-term penalty
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs the model with externally fixed parameters
    ///
    /// Parameters passed as `Some` are not re-estimated. Fixing either
    /// parameter disables the re-estimation loop entirely.
    pub fn with_params(p: Option<f64>, q: Option<f64>, alpha: f64) -> Self {
        Self { p, q, alpha }
    }
}

impl Default for Generative {
    fn default() -> Self {
        Self {
            p: None,
            q: None,
            alpha: 3.0,
        }
    }
}

/// Sufficient statistics of an active-term state
#[derive(Debug, Copy, Clone, Default)]
struct ModelStats {
    /// Study genes covered by at least one active term
    ag: usize,
    /// Study genes covered by no active term
    an: usize,
    /// Non-study genes covered by at least one active term
    sg: usize,
    /// Non-study genes covered by no active term
    sn: usize,
}

struct Model<'a> {
    term_genes: Vec<&'a GeneSet>,
    study: &'a GeneSet,
    study_size: usize,
    population_size: usize,
    alpha: f64,
}

impl Model<'_> {
    fn stats(&self, active: &[bool]) -> ModelStats {
        let mut covered_study = GeneSet::new();
        let mut covered_other = GeneSet::new();
        for (genes, _) in self
            .term_genes
            .iter()
            .zip(active)
            .filter(|(_, active)| **active)
        {
            for gene in genes.iter() {
                if self.study.contains(&gene) {
                    covered_study.insert(gene);
                } else {
                    covered_other.insert(gene);
                }
            }
        }

        let ag = covered_study.len();
        let sg = covered_other.len();
        ModelStats {
            ag,
            an: self.study_size - ag,
            sg,
            sn: (self.population_size - self.study_size).saturating_sub(sg),
        }
    }

    fn objective(&self, active: &[bool], p: f64, q: f64) -> f64 {
        // a zero count contributes nothing, even when its log diverges
        fn weighted_ln(weight: usize, value: f64) -> f64 {
            if weight == 0 {
                0.0
            } else {
                weight as f64 * value.ln()
            }
        }

        let stats = self.stats(active);
        let n_active = active.iter().filter(|is_active| **is_active).count();

        weighted_ln(stats.ag, p) + weighted_ln(stats.an, q)
            + weighted_ln(stats.sg, 1.0 - p)
            + weighted_ln(stats.sn, 1.0 - q)
            - self.alpha * n_active as f64
    }

    /// Single-toggle hill climbing to a local optimum
    fn optimize(&self, active: &mut [bool], p: f64, q: f64) {
        let mut objective = self.objective(active, p, q);
        loop {
            let mut best = f64::NEG_INFINITY;
            let mut best_term = None;
            for idx in 0..active.len() {
                active[idx] = !active[idx];
                let toggled = self.objective(active, p, q);
                if toggled > best {
                    best = toggled;
                    best_term = Some(idx);
                }
                active[idx] = !active[idx];
            }

            match best_term {
                Some(idx) if best > objective => {
                    active[idx] = !active[idx];
                    objective = best;
                }
                _ => break,
            }
        }
    }
}

impl<G, A> PValueStrategy<G, A> for Generative
where
    G: OntologyGraph,
    A: AssociationContainer,
{
    fn name(&self) -> &'static str {
        "Generative-Model"
    }

    fn description(&self) -> &'static str {
        "Greedy active-term selection under a probabilistic generative model"
    }

    fn calculate(&self, ctx: &CalcContext<'_, G, A>, study: &StudySet) -> Vec<TermPValue> {
        let model = Model {
            term_genes: ctx
                .terms()
                .iter()
                .map(|&term| ctx.population_index().annotated_genes(term).total())
                .collect(),
            study: study.genes(),
            study_size: study.len(),
            population_size: ctx.population().len(),
            alpha: self.alpha,
        };

        let mut p = self.p.unwrap_or(0.5);
        let mut q = self
            .q
            .unwrap_or(study.len() as f64 / ctx.population().len().max(1) as f64);

        let mut active = vec![false; ctx.terms().len()];
        loop {
            active.fill(false);
            model.optimize(&mut active, p, q);

            // externally supplied parameters are never re-estimated
            if self.p.is_some() || self.q.is_some() {
                break;
            }

            let stats = model.stats(&active);
            let p_next = stats.ag as f64 / (stats.ag + stats.sg) as f64;
            let q_next = stats.an as f64 / (stats.an + stats.sn) as f64;
            if p_next.is_nan() || q_next.is_nan() {
                debug!("parameter estimation is degenerate: {stats:?}");
                break;
            }
            if (p_next - p).abs() < PARAM_EPSILON && (q_next - q).abs() < PARAM_EPSILON {
                break;
            }
            p = p_next;
            q = q_next;
        }
        debug!(
            "converged with p={p}, q={q} and {} active terms",
            active.iter().filter(|is_active| **is_active).count()
        );

        // conventional p-values, informational for the active terms only
        let mut records = super::TermForTerm.calculate(ctx, study);
        for (record, is_active) in records.iter_mut().zip(&active) {
            if *is_active {
                record.detail = StrategyDetail::Generative { active: true };
            } else {
                record.pvalue = PValue::ignored();
                record.detail = StrategyDetail::Generative { active: false };
            }
        }
        records
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotations::Associations;
    use crate::graph::Ontology;
    use crate::{GeneId, Namespace, TermId};

    /// root(1) with two independent terms a(2) and b(3)
    fn fixture() -> (Ontology, Associations) {
        let root = TermId::go(1);
        let mut onto = Ontology::new(root, "all", Namespace::BiologicalProcess);
        onto.insert_term(TermId::go(2), "a", Namespace::BiologicalProcess)
            .unwrap();
        onto.insert_term(TermId::go(3), "b", Namespace::BiologicalProcess)
            .unwrap();
        onto.add_parent(TermId::go(2), root).unwrap();
        onto.add_parent(TermId::go(3), root).unwrap();

        let mut assocs = Associations::new();
        // a covers exactly the genes 0..10, b covers 20..30
        for gene in 0u32..10 {
            assocs.add(gene.into(), TermId::go(2));
        }
        for gene in 20u32..30 {
            assocs.add(gene.into(), TermId::go(3));
        }
        (onto, assocs)
    }

    #[test]
    fn explaining_term_is_selected() {
        let (onto, assocs) = fixture();
        let population: StudySet = (0u32..100).map(GeneId::from).collect();
        // the study set is exactly term a's annotation
        let study: StudySet = (0u32..10).map(GeneId::from).collect();

        let ctx = CalcContext::new(&onto, &assocs, &population);
        let records = Generative::with_params(Some(0.9), Some(0.01), 3.0).calculate(&ctx, &study);

        let a = records.iter().find(|r| r.term == TermId::go(2)).unwrap();
        assert_eq!(a.detail, StrategyDetail::Generative { active: true });
        assert!(!a.pvalue.ignore_at_mtc);

        let b = records.iter().find(|r| r.term == TermId::go(3)).unwrap();
        assert_eq!(b.detail, StrategyDetail::Generative { active: false });
        assert!(b.pvalue.ignore_at_mtc);
        assert!((b.pvalue.p - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn free_parameters_converge() {
        let (onto, assocs) = fixture();
        let population: StudySet = (0u32..100).map(GeneId::from).collect();
        let study: StudySet = (0u32..10).map(GeneId::from).collect();

        let ctx = CalcContext::new(&onto, &assocs, &population);
        let records = Generative::new().calculate(&ctx, &study);

        // the perfectly explaining term ends up active
        let a = records.iter().find(|r| r.term == TermId::go(2)).unwrap();
        assert_eq!(a.detail, StrategyDetail::Generative { active: true });
    }
}
