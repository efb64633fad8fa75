//! Problems with non-constant functions

use fmf_rs::fol::{Clause, Literal, Problem, Signature};
use fmf_rs::solver::{Finder, Options};

/// `e(c)`, `e(f(X)) <-> e(X)` has the one-point model c = f(1) = 1, e(1)
#[test]
fn fixpoint_function_solves_at_size_one() {
    let mut sig = Signature::new();
    let s = sig.add_sort("S");
    let c = sig.add_function("c", &[], s);
    let f = sig.add_function("f", &[s], s);
    let e = sig.add_predicate("e", &[s]);
    let mut problem = Problem::new(sig);
    // { c != X | e(X) }
    problem.add_clause(Clause::new(
        1,
        vec![
            Literal::fun_eq(false, c, vec![], 0),
            Literal::pred(true, e, vec![0]),
        ],
    ));
    // { f(X) != Y | ~e(Y) | e(X) }
    problem.add_clause(Clause::new(
        2,
        vec![
            Literal::fun_eq(false, f, vec![0], 1),
            Literal::pred(false, e, vec![1]),
            Literal::pred(true, e, vec![0]),
        ],
    ));
    // { f(X) != Y | e(Y) | ~e(X) }
    problem.add_clause(Clause::new(
        2,
        vec![
            Literal::fun_eq(false, f, vec![0], 1),
            Literal::pred(true, e, vec![1]),
            Literal::pred(false, e, vec![0]),
        ],
    ));

    for xmass in [false, true] {
        let options = Options {
            xmass,
            ..Options::default()
        };
        let finder = Finder::new(options).unwrap();
        let outcome = finder.solve(&problem).unwrap();
        assert!(outcome.is_satisfiable(), "xmass={}", xmass);
        assert_eq!(outcome.statistics().iterations(), 1, "xmass={}", xmass);

        let model = outcome.model().unwrap();
        assert_eq!(model.declared_sort_size(s), 1);
        assert_eq!(model.constant(c), Some(1));
        assert_eq!(model.function_value(f, &[1]), Some(1));
        assert_eq!(model.predicate_value(e, &[1]), Some(true));
    }
}

/// A function that must avoid its argument forces a second element
///
/// Sort refinement bounds the argument subsort to its single relevant
/// element, so only `f(1)` is encoded; the clause pushes its value to 2.
#[test]
fn fixpoint_free_function_needs_size_two() {
    let mut sig = Signature::new();
    let s = sig.add_sort("S");
    let f = sig.add_function("f", &[s], s);
    let mut problem = Problem::new(sig);
    // { f(X) != Y | X != Y }: f has no fixpoint
    problem.add_clause(Clause::new(
        2,
        vec![
            Literal::fun_eq(false, f, vec![0], 1),
            Literal::var_eq(false, 0, 1, s),
        ],
    ));

    let finder = Finder::new(Options::default()).unwrap();
    let outcome = finder.solve(&problem).unwrap();
    assert!(outcome.is_satisfiable());
    assert_eq!(outcome.statistics().iterations(), 2);

    let model = outcome.model().unwrap();
    assert_eq!(model.declared_sort_size(s), 2);
    assert_eq!(model.function_value(f, &[1]), Some(2));
}
