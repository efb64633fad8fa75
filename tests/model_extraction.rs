//! Reconstruction of symbols eliminated by preprocessing

use fmf_rs::fol::{
    Clause, DefFormula, FunctionDefinition, Literal, PredicateDefinition, Problem, Signature, Term,
};
use fmf_rs::solver::{Finder, Options};

/// Deleted symbols are evaluated from their stored definitions against the
/// extracted tables
#[test]
fn deleted_symbols_are_reconstructed() {
    let mut sig = Signature::new();
    let s = sig.add_sort("S");
    let c = sig.add_function("c", &[], s);
    let d = sig.add_function("d", &[], s);
    let p = sig.add_predicate("p", &[s]);
    let r = sig.add_predicate("r", &[s]);
    let t = sig.add_predicate("t", &[]);

    let mut problem = Problem::new(sig);
    // { c != X | p(X) } keeps c and p live
    problem.add_clause(Clause::new(
        1,
        vec![
            Literal::fun_eq(false, c, vec![], 0),
            Literal::pred(true, p, vec![0]),
        ],
    ));
    // d was eliminated with the definition d = c
    problem.add_deleted_function(
        d,
        FunctionDefinition {
            arg_vars: vec![],
            body: Term::App(c, vec![]),
        },
    );
    // r was eliminated with the definition r(X) <-> ~p(X)
    problem.add_deleted_predicate(
        r,
        PredicateDefinition {
            arg_vars: vec![0],
            positive: true,
            body: DefFormula::Literal {
                positive: false,
                predicate: p,
                args: vec![Term::Var(0)],
            },
        },
    );
    // t was found trivially true
    problem.add_trivial_predicate(t, true);

    let finder = Finder::new(Options::default()).unwrap();
    let outcome = finder.solve(&problem).unwrap();
    assert!(outcome.is_satisfiable());

    let model = outcome.model().unwrap();
    assert_eq!(model.constant(c), Some(1));
    assert_eq!(model.predicate_value(p, &[1]), Some(true));
    // d copies c's value; r negates p pointwise; t keeps its recorded value
    assert_eq!(model.constant(d), Some(1));
    assert_eq!(model.predicate_value(r, &[1]), Some(false));
    assert_eq!(model.proposition(t), Some(true));
}

/// The printed model lists sorts and tables
#[test]
fn display_is_reasonable() {
    let mut sig = Signature::new();
    let s = sig.add_sort("S");
    let c = sig.add_function("c", &[], s);
    let p = sig.add_predicate("p", &[s]);
    let mut problem = Problem::new(sig);
    problem.add_clause(Clause::new(
        1,
        vec![
            Literal::fun_eq(false, c, vec![], 0),
            Literal::pred(true, p, vec![0]),
        ],
    ));

    let finder = Finder::new(Options::default()).unwrap();
    let outcome = finder.solve(&problem).unwrap();
    let text = outcome.model().unwrap().to_string();
    assert!(text.contains("sort S has size 1"));
    assert!(text.contains("c = 1"));
    assert!(text.contains("p(1) = true"));
}
