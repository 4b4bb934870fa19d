//! The independent per-term test
use crate::annotations::AssociationContainer;
use crate::calculation::{CalcContext, PValueStrategy, StrategyDetail, TermPValue};
use crate::enumeration::TermCounter;
use crate::graph::OntologyGraph;
use crate::stats::hypergeom;
use crate::StudySet;

/// Tests every term independently
///
/// The raw p-value of a term is the upper-tail hypergeometric probability
/// of drawing at least as many term-annotated genes as observed in the
/// study set, when drawing `study.len()` genes without replacement from
/// the population. This is the baseline all other strategies refine.
#[derive(Debug, Default, Copy, Clone)]
pub struct TermForTerm;

impl<G, A> PValueStrategy<G, A> for TermForTerm
where
    G: OntologyGraph,
    A: AssociationContainer,
{
    fn name(&self) -> &'static str {
        "Term-For-Term"
    }

    fn description(&self) -> &'static str {
        "Independent hypergeometric test for every single term"
    }

    fn calculate(&self, ctx: &CalcContext<'_, G, A>, study: &StudySet) -> Vec<TermPValue> {
        let study_counts = TermCounter::count(ctx.graph(), ctx.associations(), study);
        let pop_total = ctx.population().len();
        let study_total = study.len();

        ctx.terms()
            .iter()
            .map(|&term| {
                let pop_count = ctx.population_index().annotated_genes(term).total_count();
                let study_count = study_counts.term_count(term).total;

                TermPValue {
                    term,
                    annotated_population_genes: pop_count,
                    annotated_study_genes: study_count,
                    pvalue: hypergeom::test_overrepresentation(
                        pop_total,
                        pop_count,
                        study_total,
                        study_count,
                    ),
                    detail: StrategyDetail::None,
                }
            })
            .collect()
    }
}
