mod common;

use common::{genes, layered_scenario, small_scenario, term};
use goenrich::calculation::{
    run_seeded, Generative, ParentChild, StrategyDetail, TermForTerm, TopologyElim,
};
use goenrich::mtc::{NoCorrection, RunControl, Storey};
use goenrich::EnrichedResult;

fn run_uncorrected<S>(strategy: &S) -> EnrichedResult
where
    S: goenrich::calculation::PValueStrategy<goenrich::Ontology, goenrich::annotations::Associations>,
{
    let (onto, assocs, population, study) = layered_scenario();
    run_seeded(
        &onto,
        &assocs,
        &population,
        &study,
        strategy,
        &NoCorrection,
        &RunControl::default(),
        1,
    )
    .unwrap()
}

#[test]
fn term_for_term_matches_the_closed_form() {
    let (onto, assocs, population, study) = small_scenario();
    let result = run_seeded(
        &onto,
        &assocs,
        &population,
        &study,
        &TermForTerm,
        &NoCorrection,
        &RunControl::default(),
        1,
    )
    .unwrap();

    assert_eq!(result.calculation(), "Term-For-Term");
    assert_eq!(result.correction(), "None");
    assert_eq!(result.population_size(), 10);
    assert_eq!(result.study_size(), 4);

    let x = result.term(term(2)).unwrap();
    assert_eq!(x.annotated_population_genes, 3);
    assert_eq!(x.annotated_study_genes, 2);
    assert!((x.pvalue.p - 1.0 / 3.0).abs() < 1e-12);
    // no correction leaves the p-value unchanged
    assert!((x.pvalue.p_adjusted - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn ignored_terms_always_report_one() {
    for result in [
        run_uncorrected(&TermForTerm),
        run_uncorrected(&ParentChild),
        run_uncorrected(&TopologyElim::default()),
        run_uncorrected(&Generative::default()),
    ] {
        for record in &result {
            if record.pvalue.ignore_at_mtc {
                assert!(
                    (record.pvalue.p - 1.0).abs() < f64::EPSILON,
                    "{} is ignored but has p = {}",
                    record.term,
                    record.pvalue.p
                );
            }
        }
    }
}

#[test]
fn terms_without_study_annotation_are_dropped() {
    let (onto, assocs, population, _) = layered_scenario();
    // the study set avoids b's genes entirely
    let study = genes([0, 1, 2, 3]);

    for result in [
        run_seeded(
            &onto,
            &assocs,
            &population,
            &study,
            &TermForTerm,
            &NoCorrection,
            &RunControl::default(),
            1,
        )
        .unwrap(),
        run_seeded(
            &onto,
            &assocs,
            &population,
            &study,
            &ParentChild,
            &NoCorrection,
            &RunControl::default(),
            1,
        )
        .unwrap(),
    ] {
        assert!(result.term(term(3)).is_none(), "b must not be reported");
        assert!(result.term(term(4)).is_some());
    }
}

#[test]
fn study_genes_outside_the_population_are_ignored() {
    let (onto, assocs, population, _) = small_scenario();
    let study = genes([0, 1, 5, 6, 999]);

    let result = run_seeded(
        &onto,
        &assocs,
        &population,
        &study,
        &TermForTerm,
        &NoCorrection,
        &RunControl::default(),
        1,
    )
    .unwrap();

    assert_eq!(result.study_size(), 4);
    let x = result.term(term(2)).unwrap();
    assert!((x.pvalue.p - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn parent_child_flags_the_root() {
    let result = run_uncorrected(&ParentChild);

    let root = result.term(term(1)).unwrap();
    assert!(root.pvalue.ignore_at_mtc);

    // c is tested against a's annotation only
    let c = result.term(term(4)).unwrap();
    let StrategyDetail::ParentChild {
        pop_family,
        study_family,
        n_parents,
    } = c.detail
    else {
        panic!("parent-child details expected");
    };
    assert_eq!(pop_family, 8);
    assert_eq!(study_family, 4);
    assert_eq!(n_parents, 1);
    assert!(!c.pvalue.ignore_at_mtc);
}

#[test]
fn topology_elim_reduces_the_ancestor_counts() {
    let result = run_uncorrected(&TopologyElim::default());

    // c is highly enriched: 4 of 4 annotated genes in a 6 gene study set
    let c = result.term(term(4)).unwrap();
    assert!(c.pvalue.p < 0.01);

    // a's genes are all eliminated by c, only the raw counts remain
    let a = result.term(term(2)).unwrap();
    assert_eq!(a.annotated_study_genes, 4);
    assert!(a.pvalue.ignore_at_mtc);
}

#[test]
fn generative_model_flags_inactive_terms() {
    let result = run_uncorrected(&Generative::with_params(Some(0.9), Some(0.05), 3.0));

    let c = result.term(term(4)).unwrap();
    assert_eq!(c.detail, StrategyDetail::Generative { active: true });
    assert!(!c.pvalue.ignore_at_mtc);

    let b = result.term(term(3)).unwrap();
    assert_eq!(b.detail, StrategyDetail::Generative { active: false });
    assert!(b.pvalue.ignore_at_mtc);
    assert!((b.pvalue.p - 1.0).abs() < f64::EPSILON);
}

#[test]
fn storey_qvalues_are_monotone() {
    let (onto, assocs, population, study) = layered_scenario();
    let result = run_seeded(
        &onto,
        &assocs,
        &population,
        &study,
        &TermForTerm,
        &Storey,
        &RunControl::default(),
        1,
    )
    .unwrap();

    let sorted = result.sorted_by_p();
    for window in sorted.windows(2) {
        if !window[0].pvalue.ignore_at_mtc && !window[1].pvalue.ignore_at_mtc {
            assert!(window[0].pvalue.p_adjusted <= window[1].pvalue.p_adjusted);
        }
    }
    for record in &result {
        assert!(record.pvalue.p_adjusted <= 1.0);
        assert!(record.pvalue.p_adjusted >= record.pvalue.p || record.pvalue.ignore_at_mtc);
    }
}
