//! Enumeration of direct and transitive term annotations
//!
//! Builds the per-term gene lists an enrichment calculation works with.
//! [`AnnotationIndex`] retains gene identities and is required by the
//! strategies that need to know *which* genes are annotated to a term.
//! [`TermCounter`] is the reduced, counts-only flavor for strategies that
//! only compare group sizes.
use std::collections::HashMap;

use crate::annotations::AssociationContainer;
use crate::graph::OntologyGraph;
use crate::{GeneId, GeneSet, Namespace, StudySet, TermId};

/// The genes annotated to a single term
///
/// `direct` holds one entry per association record, so a gene with two
/// annotation records to the same term (e.g. from two evidence codes)
/// appears twice. `total` additionally covers all genes annotated to any
/// descendant term and is deduplicated by construction.
#[derive(Debug, Default, Clone)]
pub struct AnnotatedGenes {
    direct: Vec<GeneId>,
    total: GeneSet,
}

static EMPTY_ANNOTATED: AnnotatedGenes = AnnotatedGenes {
    direct: Vec::new(),
    total: GeneSet::EMPTY,
};

impl AnnotatedGenes {
    /// The directly annotated genes, one entry per association record
    pub fn direct(&self) -> &[GeneId] {
        &self.direct
    }

    /// The transitively annotated genes
    pub fn total(&self) -> &GeneSet {
        &self.total
    }

    /// The number of direct annotation records
    pub fn direct_count(&self) -> usize {
        self.direct.len()
    }

    /// The number of distinct, transitively annotated genes
    pub fn total_count(&self) -> usize {
        self.total.len()
    }
}

/// Per-term annotation enumeration for a gene set
///
/// For every gene the index records the gene in the `direct` list of each
/// directly annotated term, then performs one deduplicated walk towards
/// the DAG root and adds the gene to the `total` set of every visited
/// term. A gene reaching a term through multiple paths is added only
/// once. Terms that are not relevant for the current analysis are
/// skipped, genes without any annotation are silently ignored.
///
/// The index is immutable after construction and owned by the calculation
/// that built it.
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    map: HashMap<TermId, AnnotatedGenes>,
}

impl AnnotationIndex {
    /// Enumerates all annotations of the given genes
    pub fn build<G, A>(graph: &G, associations: &A, genes: &StudySet) -> Self
    where
        G: OntologyGraph,
        A: AssociationContainer,
    {
        let mut map: HashMap<TermId, AnnotatedGenes> = HashMap::new();
        for gene in genes.iter() {
            let mut seeds: Vec<TermId> = Vec::new();
            for &term in associations.terms_of(gene) {
                if !graph.is_relevant(term) {
                    continue;
                }
                map.entry(term).or_default().direct.push(gene);
                if !seeds.contains(&term) {
                    seeds.push(term);
                }
            }
            if seeds.is_empty() {
                continue;
            }
            graph.walk_to_root(&seeds, &mut |term| {
                if graph.is_relevant(term) {
                    map.entry(term).or_default().total.insert(gene);
                }
                true
            });
        }
        Self { map }
    }

    /// The genes annotated to the given term
    ///
    /// Returns empty gene lists for terms without annotations.
    pub fn annotated_genes(&self, term: TermId) -> &AnnotatedGenes {
        self.map.get(&term).unwrap_or(&EMPTY_ANNOTATED)
    }

    /// Iterates over all terms with at least one annotated gene,
    /// in unspecified order
    pub fn terms(&self) -> impl Iterator<Item = TermId> + '_ {
        self.map.keys().copied()
    }

    /// The number of terms with at least one annotated gene
    pub fn n_annotated_terms(&self) -> usize {
        self.map.len()
    }

    /// All genes with at least one annotation
    pub fn genes(&self) -> GeneSet {
        let mut genes = GeneSet::new();
        for annotated in self.map.values() {
            for gene in &annotated.direct {
                genes.insert(*gene);
            }
        }
        genes
    }
}

/// Direct and transitive annotation counts of a single term
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TermCount {
    /// Number of direct annotation records
    pub direct: usize,
    /// Number of distinct, transitively annotated genes
    pub total: usize,
}

/// Counts-only annotation enumeration
///
/// Keeps one bucket per [`Namespace`] since every term belongs to exactly
/// one sub-ontology. Much cheaper than [`AnnotationIndex`] when gene
/// identities are not needed.
#[derive(Debug, Default)]
pub struct TermCounter {
    buckets: [HashMap<TermId, TermCount>; 3],
}

impl TermCounter {
    /// Counts all annotations of the given genes
    pub fn count<G, A>(graph: &G, associations: &A, genes: &StudySet) -> Self
    where
        G: OntologyGraph,
        A: AssociationContainer,
    {
        let mut buckets: [HashMap<TermId, TermCount>; 3] = Default::default();
        for gene in genes.iter() {
            let mut seeds: Vec<TermId> = Vec::new();
            for &term in associations.terms_of(gene) {
                if !graph.is_relevant(term) {
                    continue;
                }
                let Some(namespace) = graph.namespace_of(term) else {
                    continue;
                };
                buckets[namespace.index()].entry(term).or_default().direct += 1;
                if !seeds.contains(&term) {
                    seeds.push(term);
                }
            }
            if seeds.is_empty() {
                continue;
            }
            graph.walk_to_root(&seeds, &mut |term| {
                if graph.is_relevant(term) {
                    if let Some(namespace) = graph.namespace_of(term) {
                        buckets[namespace.index()].entry(term).or_default().total += 1;
                    }
                }
                true
            });
        }
        Self { buckets }
    }

    /// The counts of a term, looked up across all namespace buckets
    pub fn term_count(&self, term: TermId) -> TermCount {
        for namespace in Namespace::ALL {
            if let Some(count) = self.buckets[namespace.index()].get(&term) {
                return *count;
            }
        }
        TermCount::default()
    }

    /// The counts of a term within a known namespace
    pub fn count_in(&self, namespace: Namespace, term: TermId) -> TermCount {
        self.buckets[namespace.index()]
            .get(&term)
            .copied()
            .unwrap_or_default()
    }

    /// The number of annotated terms across all namespaces
    pub fn n_annotated_terms(&self) -> usize {
        self.buckets.iter().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotations::Associations;
    use crate::graph::Ontology;

    /// root(1) -> a(2) -> c(4), root -> b(3) -> c(4)
    fn diamond() -> Ontology {
        let mut onto = Ontology::new(TermId::go(1), "all", Namespace::BiologicalProcess);
        for (id, name) in [(2, "a"), (3, "b"), (4, "c")] {
            onto.insert_term(TermId::go(id), name, Namespace::BiologicalProcess)
                .unwrap();
        }
        onto.add_parent(TermId::go(2), TermId::go(1)).unwrap();
        onto.add_parent(TermId::go(3), TermId::go(1)).unwrap();
        onto.add_parent(TermId::go(4), TermId::go(2)).unwrap();
        onto.add_parent(TermId::go(4), TermId::go(3)).unwrap();
        onto
    }

    #[test]
    fn gene_is_propagated_once_per_term() {
        let onto = diamond();
        let mut assocs = Associations::new();
        assocs.add(7u32.into(), TermId::go(4));

        let genes: StudySet = [7u32.into()].into_iter().collect();
        let index = AnnotationIndex::build(&onto, &assocs, &genes);

        // the gene reaches the root via both a and b but is counted once
        assert_eq!(index.annotated_genes(TermId::go(1)).total_count(), 1);
        assert_eq!(index.annotated_genes(TermId::go(2)).total_count(), 1);
        assert_eq!(index.annotated_genes(TermId::go(4)).direct_count(), 1);
        assert_eq!(index.n_annotated_terms(), 4);
    }

    #[test]
    fn duplicate_records_double_count_direct_only() {
        let onto = diamond();
        let mut assocs = Associations::new();
        assocs.add(7u32.into(), TermId::go(4));
        assocs.add(7u32.into(), TermId::go(4));

        let genes: StudySet = [7u32.into()].into_iter().collect();
        let index = AnnotationIndex::build(&onto, &assocs, &genes);

        assert_eq!(index.annotated_genes(TermId::go(4)).direct_count(), 2);
        assert_eq!(index.annotated_genes(TermId::go(4)).total_count(), 1);
    }

    #[test]
    fn unannotated_genes_are_ignored() {
        let onto = diamond();
        let mut assocs = Associations::new();
        assocs.add(7u32.into(), TermId::go(4));

        let genes: StudySet = [7u32.into(), 8u32.into()].into_iter().collect();
        let index = AnnotationIndex::build(&onto, &assocs, &genes);

        assert_eq!(index.genes().len(), 1);
    }

    #[test]
    fn annotations_to_unknown_terms_are_skipped() {
        let onto = diamond();
        let mut assocs = Associations::new();
        assocs.add(7u32.into(), TermId::go(999));

        let genes: StudySet = [7u32.into()].into_iter().collect();
        let index = AnnotationIndex::build(&onto, &assocs, &genes);

        assert_eq!(index.n_annotated_terms(), 0);
    }

    #[test]
    fn counter_matches_index() {
        let onto = diamond();
        let mut assocs = Associations::new();
        assocs.add(7u32.into(), TermId::go(4));
        assocs.add(8u32.into(), TermId::go(2));

        let genes: StudySet = [7u32.into(), 8u32.into()].into_iter().collect();
        let index = AnnotationIndex::build(&onto, &assocs, &genes);
        let counter = TermCounter::count(&onto, &assocs, &genes);

        assert_eq!(counter.n_annotated_terms(), index.n_annotated_terms());
        for term in index.terms() {
            let annotated = index.annotated_genes(term);
            assert_eq!(counter.term_count(term).total, annotated.total_count());
            assert_eq!(counter.term_count(term).direct, annotated.direct_count());
        }
        assert_eq!(
            counter.count_in(Namespace::BiologicalProcess, TermId::go(2)),
            TermCount {
                direct: 1,
                total: 2
            }
        );
        assert_eq!(
            counter.count_in(Namespace::MolecularFunction, TermId::go(2)),
            TermCount::default()
        );
    }
}
