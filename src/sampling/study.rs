//! Study set sampling, uniform and term-biased
use std::collections::HashSet;

use rand::Rng;
use tracing::warn;

use crate::annotations::AssociationContainer;
use crate::enumeration::AnnotationIndex;
use crate::graph::OntologyGraph;
use crate::sampling::{KSubsetSampler, WeightedUrn};
use crate::{EnrichmentError, GeneId, GeneSet, Result, StudySet, TermId};

/// Specifies how terms should be over-represented in a sampled study set
///
/// For every listed term the rule holds the percentage of the term's
/// genes that must appear in the sample. The noise percentage controls
/// how many of the remaining, unlisted genes are added on top.
#[derive(Debug, Default, Clone)]
pub struct PercentageEnrichmentRule {
    term_percentages: Vec<(TermId, u8)>,
    noise_percentage: u8,
}

impl PercentageEnrichmentRule {
    /// Constructs an empty rule without noise
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a term and its sampling percentage
    ///
    /// # Errors
    ///
    /// [`EnrichmentError::InvalidPercentage`] if `percentage` exceeds 100.
    pub fn add_term(&mut self, term: TermId, percentage: u8) -> Result<()> {
        if percentage > 100 {
            return Err(EnrichmentError::InvalidPercentage(percentage));
        }
        self.term_percentages.push((term, percentage));
        Ok(())
    }

    /// Sets the percentage of unlisted genes sampled as noise
    ///
    /// # Errors
    ///
    /// [`EnrichmentError::InvalidPercentage`] if `percentage` exceeds 100.
    pub fn set_noise_percentage(&mut self, percentage: u8) -> Result<()> {
        if percentage > 100 {
            return Err(EnrichmentError::InvalidPercentage(percentage));
        }
        self.noise_percentage = percentage;
        Ok(())
    }

    /// The percentage of unlisted genes sampled as noise
    pub fn noise_percentage(&self) -> u8 {
        self.noise_percentage
    }

    /// Iterates over the listed terms and their percentages
    pub fn terms(&self) -> impl Iterator<Item = (TermId, u8)> + '_ {
        self.term_percentages.iter().copied()
    }

    /// The number of listed terms
    pub fn len(&self) -> usize {
        self.term_percentages.len()
    }

    /// Returns `true` if no term is listed
    pub fn is_empty(&self) -> bool {
        self.term_percentages.is_empty()
    }
}

/// Samples sub study sets from a base gene set
///
/// The plain [`StudySetSampler::sample_random_study_set`] drives the
/// resampling corrections. The term-biased variants construct study sets
/// with a controlled signal for benchmarking.
#[derive(Debug)]
pub struct StudySetSampler<R> {
    base: StudySet,
    rng: R,
}

/// Adds a random sample of `desired` genes from `repository` to `study`
///
/// Genes already present in the study set count towards the desired
/// size, only the missing remainder is drawn.
fn add_sample<R: Rng>(rng: &mut R, study: &mut GeneSet, desired: usize, repository: &GeneSet) {
    if desired == 0 {
        return;
    }

    let already_there = &*study & repository;
    if already_there.len() >= desired {
        warn!(
            "the study set already contains {} of the {desired} requested genes",
            already_there.len()
        );
        return;
    }
    let missing = desired - already_there.len();

    let pool = repository - &*study;
    let mut sampler = KSubsetSampler::new(pool.iter());
    for gene in sampler.sample_one_ordered(missing, rng) {
        study.insert(gene);
    }
}

impl<R: Rng> StudySetSampler<R> {
    /// Constructs a sampler drawing from `base`
    pub fn new(base: StudySet, rng: R) -> Self {
        Self { base, rng }
    }

    /// The gene set samples are drawn from
    pub fn base(&self) -> &StudySet {
        &self.base
    }

    /// Samples a uniform random study set of the desired size
    ///
    /// The size is clamped to the base set size.
    pub fn sample_random_study_set(&mut self, desired: usize) -> StudySet {
        let mut genes = GeneSet::new();
        add_sample(&mut self.rng, &mut genes, desired, self.base.genes());
        StudySet::from(genes)
    }

    /// Samples a uniform random study set of uniformly random size
    pub fn sample_random_sized(&mut self) -> StudySet {
        let desired = (self.rng.gen::<f64>() * self.base.len() as f64).floor() as usize;
        self.sample_random_study_set(desired)
    }

    /// Samples a study set with controlled term signals
    ///
    /// For every term listed in the rule, the given percentage of its
    /// transitively annotated genes is added, deduplicated against genes
    /// already selected for previously listed terms. Afterwards the
    /// noise percentage of all remaining annotated genes is mixed in.
    ///
    /// Returns `None` if the computed sample size of any listed term
    /// rounds to zero: the request is infeasible and callers routinely
    /// probe for that instead of handling degenerate study sets.
    pub fn sample_with_rule<G, A>(
        &mut self,
        graph: &G,
        associations: &A,
        rule: &PercentageEnrichmentRule,
    ) -> Option<StudySet>
    where
        G: OntologyGraph,
        A: AssociationContainer,
    {
        let index = AnnotationIndex::build(graph, associations, &self.base);
        let mut genes = GeneSet::new();
        let mut listed = GeneSet::new();

        for (term, percentage) in rule.terms() {
            let annotated = index.annotated_genes(term).total();
            listed = &listed | annotated;

            let sample_size = (0.01 * annotated.len() as f64 * f64::from(percentage)) as usize;
            if sample_size == 0 {
                return None;
            }
            add_sample(&mut self.rng, &mut genes, sample_size, annotated);
        }

        let rest = &index.genes() - &listed;
        let rest_size = (0.01 * rest.len() as f64 * f64::from(rule.noise_percentage())) as usize;
        add_sample(&mut self.rng, &mut genes, rest_size, &rest);

        Some(StudySet::from(genes))
    }

    /// Samples a study set of fixed size with an increased probability
    /// of drawing genes annotated to the given terms
    ///
    /// All genes annotated to any of the terms form the favored pool of
    /// a [`WeightedUrn`], everything else the background.
    pub fn sample_biased<G, A>(
        &mut self,
        graph: &G,
        associations: &A,
        desired: usize,
        terms: &[TermId],
        ratio: f64,
    ) -> StudySet
    where
        G: OntologyGraph,
        A: AssociationContainer,
    {
        let index = AnnotationIndex::build(graph, associations, &self.base);
        let mut favored = GeneSet::new();
        for &term in terms {
            favored = &favored | index.annotated_genes(term).total();
        }
        let background = self.base.genes() - &favored;

        let urn = WeightedUrn::new(
            favored.iter().collect::<HashSet<GeneId>>(),
            background.iter().collect::<HashSet<GeneId>>(),
            ratio,
        );
        urn.sample(desired, &mut self.rng).into_iter().collect()
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    use super::*;
    use crate::annotations::Associations;
    use crate::graph::Ontology;
    use crate::Namespace;

    fn fixture() -> (Ontology, Associations, StudySet) {
        let root = TermId::go(1);
        let mut onto = Ontology::new(root, "all", Namespace::BiologicalProcess);
        onto.insert_term(TermId::go(2), "a", Namespace::BiologicalProcess)
            .unwrap();
        onto.insert_term(TermId::go(3), "b", Namespace::BiologicalProcess)
            .unwrap();
        onto.add_parent(TermId::go(2), root).unwrap();
        onto.add_parent(TermId::go(3), root).unwrap();

        let mut assocs = Associations::new();
        for gene in 0u32..10 {
            assocs.add(gene.into(), TermId::go(2));
        }
        for gene in 10u32..20 {
            assocs.add(gene.into(), TermId::go(3));
        }

        let base: StudySet = (0u32..40).map(GeneId::from).collect();
        (onto, assocs, base)
    }

    fn sampler(base: StudySet, seed: u64) -> StudySetSampler<Xoshiro256StarStar> {
        StudySetSampler::new(base, Xoshiro256StarStar::seed_from_u64(seed))
    }

    #[test]
    fn uniform_sample_has_the_desired_size() {
        let (_, _, base) = fixture();
        let mut sampler = sampler(base.clone(), 3);

        let sample = sampler.sample_random_study_set(12);
        assert_eq!(sample.len(), 12);
        for gene in &sample {
            assert!(base.contains(&gene));
        }
    }

    #[test]
    fn rule_guarantees_the_term_percentage() {
        let (onto, assocs, base) = fixture();
        let mut sampler = sampler(base, 5);

        let mut rule = PercentageEnrichmentRule::new();
        rule.add_term(TermId::go(2), 80).unwrap();

        let sample = sampler
            .sample_with_rule(&onto, &assocs, &rule)
            .expect("the rule is feasible");

        // 80 percent of the ten genes annotated to a
        let from_a = sample.iter().filter(|gene| gene.as_u32() < 10).count();
        assert_eq!(from_a, 8);
        assert_eq!(sample.len(), 8);
    }

    #[test]
    fn rule_with_noise_adds_unlisted_genes() {
        let (onto, assocs, base) = fixture();
        let mut sampler = sampler(base, 7);

        let mut rule = PercentageEnrichmentRule::new();
        rule.add_term(TermId::go(2), 50).unwrap();
        rule.set_noise_percentage(50).unwrap();

        let sample = sampler
            .sample_with_rule(&onto, &assocs, &rule)
            .expect("the rule is feasible");

        // 5 genes from a, 5 of b's 10 unlisted genes as noise
        assert_eq!(sample.len(), 10);
        let from_b = sample.iter().filter(|gene| gene.as_u32() >= 10).count();
        assert_eq!(from_b, 5);
    }

    #[test]
    fn infeasible_rule_produces_no_study_set() {
        let (onto, assocs, base) = fixture();
        let mut sampler = sampler(base, 11);

        // 5 percent of 10 genes rounds down to zero
        let mut rule = PercentageEnrichmentRule::new();
        rule.add_term(TermId::go(2), 5).unwrap();

        assert!(sampler.sample_with_rule(&onto, &assocs, &rule).is_none());
    }

    #[test]
    fn out_of_range_percentages_are_rejected() {
        let mut rule = PercentageEnrichmentRule::new();
        assert_eq!(
            rule.add_term(TermId::go(2), 101).unwrap_err(),
            EnrichmentError::InvalidPercentage(101)
        );
        assert_eq!(
            rule.set_noise_percentage(200).unwrap_err(),
            EnrichmentError::InvalidPercentage(200)
        );
    }

    #[test]
    fn biased_sample_prefers_term_genes() {
        let (onto, assocs, base) = fixture();
        let mut sampler = sampler(base, 13);

        let sample = sampler.sample_biased(&onto, &assocs, 10, &[TermId::go(2)], 1000.0);

        assert_eq!(sample.len(), 10);
        let favored = sample.iter().filter(|gene| gene.as_u32() < 10).count();
        assert!(favored >= 9, "only {favored} favored genes sampled");
    }
}
