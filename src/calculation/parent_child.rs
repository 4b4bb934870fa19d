//! The parent-child family test
use tracing::debug;

use crate::annotations::AssociationContainer;
use crate::calculation::{CalcContext, PValueStrategy, StrategyDetail, TermPValue};
use crate::enumeration::AnnotationIndex;
use crate::graph::OntologyGraph;
use crate::stats::hypergeom;
use crate::{GeneSet, PValue, StudySet};

/// Tests every term relative to the annotations of its parents
///
/// The family of a term is the union of its direct parents' transitively
/// annotated gene sets. The family counts replace the global population
/// and study sizes of the independent test, so a term is only significant
/// if it is over-represented *within* its parents' annotations. Terms
/// that annotate exactly the same population genes as their family add no
/// discriminating information and are flagged as ignored, as is the root.
#[derive(Debug, Default, Copy, Clone)]
pub struct ParentChild;

impl<G, A> PValueStrategy<G, A> for ParentChild
where
    G: OntologyGraph,
    A: AssociationContainer,
{
    fn name(&self) -> &'static str {
        "Parent-Child-Union"
    }

    fn description(&self) -> &'static str {
        "Overrepresentation of a term compared to the union of its parents' annotations"
    }

    fn calculate(&self, ctx: &CalcContext<'_, G, A>, study: &StudySet) -> Vec<TermPValue> {
        let graph = ctx.graph();
        let study_index = AnnotationIndex::build(graph, ctx.associations(), study);

        ctx.terms()
            .iter()
            .map(|&term| {
                let pop_count = ctx.population_index().annotated_genes(term).total_count();
                let study_count = study_index.annotated_genes(term).total_count();

                if graph.is_root(term) {
                    return TermPValue {
                        term,
                        annotated_population_genes: pop_count,
                        annotated_study_genes: study_count,
                        pvalue: PValue::ignored(),
                        detail: StrategyDetail::ParentChild {
                            pop_family: 0,
                            study_family: 0,
                            n_parents: 0,
                        },
                    };
                }

                let parents = graph.parents_of(term);
                let mut pop_family = GeneSet::new();
                let mut study_family = GeneSet::new();
                for &parent in parents {
                    pop_family = &pop_family | ctx.population_index().annotated_genes(parent).total();
                    study_family = &study_family | study_index.annotated_genes(parent).total();
                }

                let pvalue = if study_count == 0 {
                    PValue::ignored()
                } else if pop_family.len() == pop_count {
                    // the term annotates its whole family
                    debug!("{term} adds no information over its parents");
                    PValue::ignored()
                } else {
                    PValue::new(
                        hypergeom::upper_tail(
                            pop_family.len(),
                            pop_count,
                            study_family.len(),
                            study_count,
                        ),
                        hypergeom::point_probability(
                            pop_count,
                            pop_family.len(),
                            pop_count,
                            pop_count,
                        ),
                    )
                };

                TermPValue {
                    term,
                    annotated_population_genes: pop_count,
                    annotated_study_genes: study_count,
                    pvalue,
                    detail: StrategyDetail::ParentChild {
                        pop_family: pop_family.len(),
                        study_family: study_family.len(),
                        n_parents: parents.len(),
                    },
                }
            })
            .collect()
    }
}
