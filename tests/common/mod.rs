//! Shared fixtures for the integration tests
#![allow(dead_code)]

use goenrich::annotations::Associations;
use goenrich::{GeneId, Namespace, Ontology, StudySet, TermId};

pub fn term(id: u32) -> TermId {
    TermId::go(id)
}

pub fn genes(ids: impl IntoIterator<Item = u32>) -> StudySet {
    ids.into_iter().map(GeneId::from).collect()
}

/// The minimal scenario: root(1) -> x(2), a population of 10 genes with
/// 3 annotated to x, and a 4 gene study set containing 2 of them.
///
/// The exact independent-test p-value of x is
/// P(X >= 2 | N=10, K=3, n=4) = 70/210 = 1/3.
pub fn small_scenario() -> (Ontology, Associations, StudySet, StudySet) {
    let root = term(1);
    let mut onto = Ontology::new(root, "all", Namespace::BiologicalProcess);
    onto.insert_term(term(2), "x", Namespace::BiologicalProcess)
        .unwrap();
    onto.add_parent(term(2), root).unwrap();

    let mut assocs = Associations::new();
    for gene in 0u32..3 {
        assocs.add(gene.into(), term(2));
    }

    let population = genes(0..10);
    let study = genes([0, 1, 5, 6]);
    (onto, assocs, population, study)
}

/// A layered scenario:
///
/// ```text
///        root(1)
///        /     \
///      a(2)   b(3)
///       |
///      c(4)
/// ```
///
/// c annotates genes 0..4, a additionally 4..8, b annotates 8..14.
/// The population holds 30 genes, the study set is biased towards c.
pub fn layered_scenario() -> (Ontology, Associations, StudySet, StudySet) {
    let root = term(1);
    let mut onto = Ontology::new(root, "all", Namespace::BiologicalProcess);
    for (id, name) in [(2, "a"), (3, "b"), (4, "c")] {
        onto.insert_term(term(id), name, Namespace::BiologicalProcess)
            .unwrap();
    }
    onto.add_parent(term(2), root).unwrap();
    onto.add_parent(term(3), root).unwrap();
    onto.add_parent(term(4), term(2)).unwrap();

    let mut assocs = Associations::new();
    for gene in 0u32..4 {
        assocs.add(gene.into(), term(4));
    }
    for gene in 4u32..8 {
        assocs.add(gene.into(), term(2));
    }
    for gene in 8u32..14 {
        assocs.add(gene.into(), term(3));
    }

    let population = genes(0..30);
    let study = genes([0, 1, 2, 3, 8, 20]);
    (onto, assocs, population, study)
}
