//! The search strategies agree on outcomes across option settings

use fmf_rs::encoder::{SymbolOrder, WidgetOrder};
use fmf_rs::fol::{Clause, Literal, Problem, Signature};
use fmf_rs::solver::{Finder, Options};

/// Two independent sorts that need sizes 2 and 3 respectively
fn two_sorts_problem() -> (Problem, u32, u32) {
    let mut sig = Signature::new();
    let s = sig.add_sort("A");
    let t = sig.add_sort("B");
    let a1 = sig.add_function("a1", &[], s);
    let a2 = sig.add_function("a2", &[], s);
    let b1 = sig.add_function("b1", &[], t);
    let b2 = sig.add_function("b2", &[], t);
    let b3 = sig.add_function("b3", &[], t);
    let mut problem = Problem::new(sig);
    // a1 != a2
    problem.add_clause(Clause::new(
        1,
        vec![
            Literal::fun_eq(false, a1, vec![], 0),
            Literal::fun_eq(false, a2, vec![], 0),
        ],
    ));
    // b1, b2, b3 pairwise distinct
    for (x, y) in [(b1, b2), (b2, b3), (b1, b3)] {
        problem.add_clause(Clause::new(
            1,
            vec![
                Literal::fun_eq(false, x, vec![], 0),
                Literal::fun_eq(false, y, vec![], 0),
            ],
        ));
    }
    (problem, s, t)
}

fn check(options: Options, label: &str) {
    let (problem, s, t) = two_sorts_problem();
    let finder = Finder::new(options).unwrap();
    let outcome = finder.solve(&problem).unwrap();
    assert!(outcome.is_satisfiable(), "{}", label);
    let model = outcome.model().unwrap();
    assert_eq!(model.declared_sort_size(s), 2, "{}", label);
    assert_eq!(model.declared_sort_size(t), 3, "{}", label);
}

#[test]
fn plain_scheme_finds_the_exact_sizes() {
    check(Options::default(), "plain");
}

#[test]
fn xmass_scheme_finds_the_exact_sizes() {
    check(
        Options {
            xmass: true,
            ..Options::default()
        },
        "xmass",
    );
    check(
        Options {
            xmass: true,
            size_weight_ratio: 0,
            ..Options::default()
        },
        "xmass, size-weighted growth only",
    );
}

#[test]
fn marker_free_and_unprioritized_walks_agree() {
    check(
        Options {
            ignore_markers: true,
            ..Options::default()
        },
        "ignore markers",
    );
    check(
        Options {
            no_priority: true,
            ..Options::default()
        },
        "no priority",
    );
}

/// An externally inferred equivalence merges the two sorts into one domain,
/// which then has to hold the three distinct constants of B alongside the
/// two of A
#[test]
fn sort_equivalences_merge_domains() {
    let (mut problem, s, t) = two_sorts_problem();
    problem.add_sort_equivalence(s, t);

    let finder = Finder::new(Options {
        detect_sort_bounds: true,
        ..Options::default()
    })
    .unwrap();
    let outcome = finder.solve(&problem).unwrap();
    assert!(outcome.is_satisfiable());
    let model = outcome.model().unwrap();
    assert_eq!(model.declared_sort_size(s), 3);
    assert_eq!(model.declared_sort_size(t), 3);
    assert_eq!(model.distinct_sizes(), &[3]);

    // Without detect_sort_bounds the recorded equivalence is ignored and
    // the sorts keep independent cardinalities
    let finder = Finder::new(Options::default()).unwrap();
    let outcome = finder.solve(&problem).unwrap();
    let model = outcome.model().unwrap();
    assert_eq!(model.declared_sort_size(s), 2);
    assert_eq!(model.declared_sort_size(t), 3);
}

#[test]
fn symmetry_variations_do_not_change_outcomes() {
    for widget_order in [
        WidgetOrder::FunctionFirst,
        WidgetOrder::ArgumentFirst,
        WidgetOrder::Diagonal,
    ] {
        check(
            Options {
                widget_order,
                ..Options::default()
            },
            "widget order",
        );
    }
    check(
        Options {
            symbol_order: SymbolOrder::Usage,
            ..Options::default()
        },
        "usage symbol order",
    );
    check(
        Options {
            symmetry_ratio: 0.0,
            ..Options::default()
        },
        "no canonicity axioms",
    );
}
