//! The topology based elimination test
use std::collections::HashMap;

use tracing::debug;

use crate::annotations::AssociationContainer;
use crate::calculation::{CalcContext, PValueStrategy, StrategyDetail, TermPValue};
use crate::enumeration::AnnotationIndex;
use crate::graph::OntologyGraph;
use crate::stats::hypergeom;
use crate::{GeneSet, PValue, StudySet, TermId};

/// Threshold below which a term's study genes are eliminated from
/// all ancestor tests
const SIGNIFICANCE_LEVEL: f64 = 0.01;

/// Tests terms bottom-up, eliminating the genes of significant children
///
/// The DAG is processed in a single post-order pass from the root. Once a
/// term tests significant, all of its study-annotated genes are marked
/// and excluded from the effective counts of every ancestor, so the same
/// signal is not counted at multiple levels of the hierarchy. Converging
/// paths are handled by a memo table, every term is resolved exactly
/// once.
///
/// The traversal is iterative with an explicit stack, the recursion depth
/// of the DAG does not matter.
#[derive(Debug, Copy, Clone)]
pub struct TopologyElim {
    significance_level: f64,
}

impl TopologyElim {
    /// Constructs the strategy with a custom elimination threshold
    pub fn new(significance_level: f64) -> Self {
        Self { significance_level }
    }
}

impl Default for TopologyElim {
    fn default() -> Self {
        Self::new(SIGNIFICANCE_LEVEL)
    }
}

struct Frame {
    term: TermId,
    next_child: usize,
}

impl<G, A> PValueStrategy<G, A> for TopologyElim
where
    G: OntologyGraph,
    A: AssociationContainer,
{
    fn name(&self) -> &'static str {
        "Topology-Elim"
    }

    fn description(&self) -> &'static str {
        "Bottom-up test eliminating the genes of significant child terms"
    }

    fn calculate(&self, ctx: &CalcContext<'_, G, A>, study: &StudySet) -> Vec<TermPValue> {
        let graph = ctx.graph();
        let study_index = AnnotationIndex::build(graph, ctx.associations(), study);
        let pop_total = ctx.population().len();
        let study_total = study.len();

        // marked gene sets live in an arena, the memo table maps a
        // resolved term to its arena slot
        let mut memo: HashMap<TermId, usize> = HashMap::new();
        let mut marked_sets: Vec<GeneSet> = Vec::new();
        let mut pvalues: HashMap<TermId, PValue> = HashMap::new();

        let mut stack = vec![Frame {
            term: graph.root(),
            next_child: 0,
        }];
        while !stack.is_empty() {
            let descend = {
                let frame = stack.last_mut().expect("the stack is not empty");
                let children = graph.children_of(frame.term);
                let mut unresolved = None;
                while frame.next_child < children.len() {
                    let child = children[frame.next_child];
                    frame.next_child += 1;
                    if !memo.contains_key(&child) {
                        unresolved = Some(child);
                        break;
                    }
                }
                unresolved
            };
            if let Some(child) = descend {
                stack.push(Frame {
                    term: child,
                    next_child: 0,
                });
                continue;
            }

            // all children resolved
            let term = stack.pop().expect("the stack is not empty").term;

            let pop_genes = ctx.population_index().annotated_genes(term);
            if pop_genes.total_count() == 0 {
                memo.insert(term, marked_sets.len());
                marked_sets.push(GeneSet::new());
                continue;
            }

            let mut marked = GeneSet::new();
            for child in graph.children_of(term) {
                if let Some(slot) = memo.get(child) {
                    marked = &marked | &marked_sets[*slot];
                }
            }

            let study_genes = study_index.annotated_genes(term);
            let effective_pop = pop_genes.total().count_without(&marked);
            let effective_study = study_genes.total().count_without(&marked);

            let pvalue = if effective_study == 0 {
                PValue::ignored()
            } else {
                let pvalue = PValue::new(
                    hypergeom::upper_tail(pop_total, effective_pop, study_total, effective_study),
                    hypergeom::point_probability(
                        effective_pop,
                        pop_total,
                        effective_pop,
                        effective_pop,
                    ),
                );
                if pvalue.p < self.significance_level {
                    debug!("{term} is significant, marking {} study genes", study_genes.total_count());
                    marked = &marked | study_genes.total();
                }
                pvalue
            };

            pvalues.insert(term, pvalue);
            memo.insert(term, marked_sets.len());
            marked_sets.push(marked);
        }

        ctx.terms()
            .iter()
            .map(|&term| TermPValue {
                term,
                annotated_population_genes: ctx
                    .population_index()
                    .annotated_genes(term)
                    .total_count(),
                annotated_study_genes: study_index.annotated_genes(term).total_count(),
                pvalue: pvalues.get(&term).copied().unwrap_or_else(PValue::ignored),
                detail: StrategyDetail::None,
            })
            .collect()
    }
}
