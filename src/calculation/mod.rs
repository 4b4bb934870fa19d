//! Enrichment calculations
//!
//! A calculation combines a p-value strategy with a multiple testing
//! correction. The strategy produces one raw p-value per
//! population-annotated term, the correction turns them into adjusted
//! p-values, [`run_seeded`] merges both into the final per-term records.
//!
//! Four strategies are available:
//!
//! - [`TermForTerm`]: every term is tested independently
//! - [`ParentChild`]: terms are tested relative to their parents'
//!   annotations
//! - [`TopologyElim`]: significant child terms eliminate their genes
//!   from ancestor tests
//! - [`Generative`]: a greedy generative-model selection of active terms
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::annotations::AssociationContainer;
use crate::enumeration::AnnotationIndex;
use crate::graph::OntologyGraph;
use crate::mtc::{MultipleTestCorrection, RunControl};
use crate::sampling::StudySetSampler;
use crate::stats::{PValue, PValueSource};
use crate::{PopulationSet, Result, StudySet, TermId};

mod generative;
mod parent_child;
mod term_for_term;
mod topology;

pub use generative::Generative;
pub use parent_child::ParentChild;
pub use term_for_term::TermForTerm;
pub use topology::TopologyElim;

/// Immutable per-run context shared by all strategy invocations
///
/// The population annotation index and the term universe are built once
/// per calculation and reused for the observed study set and for every
/// random trial of a resampling correction.
pub struct CalcContext<'a, G, A> {
    graph: &'a G,
    associations: &'a A,
    population: &'a PopulationSet,
    pop_index: AnnotationIndex,
    terms: Vec<TermId>,
}

impl<'a, G, A> CalcContext<'a, G, A>
where
    G: OntologyGraph,
    A: AssociationContainer,
{
    /// Enumerates the population annotations and fixes the term universe
    pub fn new(graph: &'a G, associations: &'a A, population: &'a PopulationSet) -> Self {
        let pop_index = AnnotationIndex::build(graph, associations, population);
        let mut terms: Vec<TermId> = pop_index.terms().collect();
        terms.sort();
        Self {
            graph,
            associations,
            population,
            pop_index,
            terms,
        }
    }

    /// All population-annotated terms, in a stable order
    ///
    /// Every strategy returns its records index-aligned to this slice.
    pub fn terms(&self) -> &[TermId] {
        &self.terms
    }

    /// The annotation enumeration of the population
    pub fn population_index(&self) -> &AnnotationIndex {
        &self.pop_index
    }

    /// The ontology DAG
    pub fn graph(&self) -> &'a G {
        self.graph
    }

    /// The gene-term associations
    pub fn associations(&self) -> &'a A {
        self.associations
    }

    /// The background population
    pub fn population(&self) -> &'a PopulationSet {
        self.population
    }
}

/// Strategy specific fields of a [`TermPValue`] record
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StrategyDetail {
    /// The strategy records nothing beyond the common fields
    None,
    /// Family counts of the parent-child test
    ParentChild {
        pop_family: usize,
        study_family: usize,
        n_parents: usize,
    },
    /// Whether the generative model selected the term as active
    Generative { active: bool },
}

/// The result record of a single term
#[derive(Clone, Debug)]
pub struct TermPValue {
    pub term: TermId,
    /// Distinct population genes transitively annotated to the term
    pub annotated_population_genes: usize,
    /// Distinct study genes transitively annotated to the term
    pub annotated_study_genes: usize,
    pub pvalue: PValue,
    pub detail: StrategyDetail,
}

/// A p-value calculation strategy
///
/// Implementations turn (population counts, study counts, DAG structure)
/// into one raw p-value per term. `calculate` must return records
/// index-aligned to [`CalcContext::terms`] regardless of the study set it
/// is invoked with, so resampling corrections can match random trial
/// entries to real ones.
pub trait PValueStrategy<G, A>
where
    G: OntologyGraph,
    A: AssociationContainer,
{
    /// Short name of the strategy, reported in the result
    fn name(&self) -> &'static str;

    /// One-line description of the strategy
    fn description(&self) -> &'static str;

    /// Calculates the per-term p-values of `study`
    fn calculate(&self, ctx: &CalcContext<'_, G, A>, study: &StudySet) -> Vec<TermPValue>;
}

/// Adapts a strategy to the [`PValueSource`] interface of the
/// multiple testing corrections
struct StrategySource<'a, G, A, S> {
    strategy: &'a S,
    ctx: &'a CalcContext<'a, G, A>,
    observed: &'a StudySet,
    sampler: StudySetSampler<Xoshiro256StarStar>,
    raw: Option<Vec<TermPValue>>,
}

impl<G, A, S> PValueSource for StrategySource<'_, G, A, S>
where
    G: OntologyGraph,
    A: AssociationContainer,
    S: PValueStrategy<G, A>,
{
    fn raw_pvalues(&mut self) -> Vec<PValue> {
        let records = self.strategy.calculate(self.ctx, self.observed);
        let pvalues = records.iter().map(|record| record.pvalue).collect();
        self.raw = Some(records);
        pvalues
    }

    fn random_trial_pvalues(&mut self) -> Vec<PValue> {
        let trial = self.sampler.sample_random_study_set(self.observed.len());
        self.strategy
            .calculate(self.ctx, &trial)
            .iter()
            .map(|record| record.pvalue)
            .collect()
    }

    fn current_study_size(&self) -> usize {
        self.observed.len()
    }

    fn n_pvalues(&self) -> usize {
        self.ctx.terms.len()
    }
}

/// The outcome of an enrichment calculation
///
/// Holds one record per term with at least one study annotation, plus the
/// names of the strategy and correction that produced it.
#[derive(Debug)]
pub struct EnrichedResult {
    results: Vec<TermPValue>,
    calculation: &'static str,
    correction: &'static str,
    population_size: usize,
    study_size: usize,
}

impl EnrichedResult {
    /// All per-term records
    pub fn results(&self) -> &[TermPValue] {
        &self.results
    }

    /// The number of reported terms
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if no term carries a study annotation
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Record references sorted by ascending raw p-value
    pub fn sorted_by_p(&self) -> Vec<&TermPValue> {
        let mut sorted: Vec<&TermPValue> = self.results.iter().collect();
        sorted.sort_by(|a, b| a.pvalue.p.total_cmp(&b.pvalue.p));
        sorted
    }

    /// The record of a single term, if it is part of the result
    pub fn term(&self, term: TermId) -> Option<&TermPValue> {
        self.results.iter().find(|record| record.term == term)
    }

    /// The name of the strategy that produced the result
    pub fn calculation(&self) -> &'static str {
        self.calculation
    }

    /// The name of the correction that produced the adjusted p-values
    pub fn correction(&self) -> &'static str {
        self.correction
    }

    /// The size of the background population
    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// The size of the study set, after restriction to the population
    pub fn study_size(&self) -> usize {
        self.study_size
    }

    /// Consumes the result, returning the records
    pub fn into_results(self) -> Vec<TermPValue> {
        self.results
    }
}

impl<'a> IntoIterator for &'a EnrichedResult {
    type Item = &'a TermPValue;
    type IntoIter = std::slice::Iter<'a, TermPValue>;
    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Runs an enrichment calculation with a random seed from the OS
///
/// See [`run_seeded`] for reproducible runs.
#[allow(clippy::too_many_arguments)]
pub fn run<G, A, S, C>(
    graph: &G,
    associations: &A,
    population: &PopulationSet,
    study: &StudySet,
    strategy: &S,
    correction: &C,
    ctrl: &RunControl,
) -> Result<EnrichedResult>
where
    G: OntologyGraph,
    A: AssociationContainer,
    S: PValueStrategy<G, A>,
    C: MultipleTestCorrection + ?Sized,
{
    run_with_rng(
        graph,
        associations,
        population,
        study,
        strategy,
        correction,
        ctrl,
        Xoshiro256StarStar::from_entropy(),
    )
}

/// Runs an enrichment calculation with a fixed random seed
///
/// Builds the population annotation index, wires the strategy to the
/// correction through the [`PValueSource`] interface (random trials draw
/// uniform study sets of identical size from the population) and merges
/// the adjusted p-values back into per-term records. Terms without study
/// annotations are dropped from the result.
///
/// Study genes that are not part of the population are ignored.
///
/// # Errors
///
/// Propagates configuration errors and cancellation from the correction.
#[allow(clippy::too_many_arguments)]
pub fn run_seeded<G, A, S, C>(
    graph: &G,
    associations: &A,
    population: &PopulationSet,
    study: &StudySet,
    strategy: &S,
    correction: &C,
    ctrl: &RunControl,
    seed: u64,
) -> Result<EnrichedResult>
where
    G: OntologyGraph,
    A: AssociationContainer,
    S: PValueStrategy<G, A>,
    C: MultipleTestCorrection + ?Sized,
{
    run_with_rng(
        graph,
        associations,
        population,
        study,
        strategy,
        correction,
        ctrl,
        Xoshiro256StarStar::seed_from_u64(seed),
    )
}

#[allow(clippy::too_many_arguments)]
fn run_with_rng<G, A, S, C>(
    graph: &G,
    associations: &A,
    population: &PopulationSet,
    study: &StudySet,
    strategy: &S,
    correction: &C,
    ctrl: &RunControl,
    rng: Xoshiro256StarStar,
) -> Result<EnrichedResult>
where
    G: OntologyGraph,
    A: AssociationContainer,
    S: PValueStrategy<G, A>,
    C: MultipleTestCorrection + ?Sized,
{
    let study: StudySet = study
        .iter()
        .filter(|gene| population.contains(gene))
        .collect();

    let ctx = CalcContext::new(graph, associations, population);
    let mut source = StrategySource {
        strategy,
        ctx: &ctx,
        observed: &study,
        sampler: StudySetSampler::new(population.clone(), rng),
        raw: None,
    };

    let adjusted = correction.adjust(&mut source, ctrl)?;

    let mut records = match source.raw.take() {
        Some(records) => records,
        // corrections are expected to request the raw p-values at
        // least once, recompute if one did not
        None => strategy.calculate(&ctx, &study),
    };
    for (record, pvalue) in records.iter_mut().zip(adjusted) {
        record.pvalue = pvalue;
    }
    records.retain(|record| record.annotated_study_genes > 0);

    Ok(EnrichedResult {
        results: records,
        calculation: strategy.name(),
        correction: correction.name(),
        population_size: population.len(),
        study_size: study.len(),
    })
}
