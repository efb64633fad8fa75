use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fmf_rs::fol::{Clause, Literal, Problem, Signature};
use fmf_rs::solver::{Finder, Options};

/// n pairwise-distinct constants over one sort: the search must climb from
/// size 1 all the way to n
fn distinct_constants_problem(n: u32) -> Problem {
    let mut sig = Signature::new();
    let s = sig.add_sort("S");
    let constants: Vec<u32> = (0..n)
        .map(|i| sig.add_function(&format!("c{}", i), &[], s))
        .collect();
    let mut problem = Problem::new(sig);
    for (i, &x) in constants.iter().enumerate() {
        for &y in &constants[i + 1..] {
            problem.add_clause(Clause::new(
                1,
                vec![
                    Literal::fun_eq(false, x, vec![], 0),
                    Literal::fun_eq(false, y, vec![], 0),
                ],
            ));
        }
    }
    problem
}

/// A function with no fixpoint whose iterates must cycle oddly: forces a
/// few growth rounds with a non-constant symbol in play
fn fixpoint_free_problem() -> Problem {
    let mut sig = Signature::new();
    let s = sig.add_sort("S");
    let f = sig.add_function("f", &[s], s);
    let a = sig.add_function("a", &[], s);
    let b = sig.add_function("b", &[], s);
    let mut problem = Problem::new(sig);
    // f(X) != X
    problem.add_clause(Clause::new(
        2,
        vec![
            Literal::fun_eq(false, f, vec![0], 1),
            Literal::var_eq(false, 0, 1, s),
        ],
    ));
    // a != b
    problem.add_clause(Clause::new(
        1,
        vec![
            Literal::fun_eq(false, a, vec![], 0),
            Literal::fun_eq(false, b, vec![], 0),
        ],
    ));
    problem
}

fn finder_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("finder");

    group.bench_function("distinct_constants_4", |b| {
        b.iter(|| {
            let problem = black_box(distinct_constants_problem(4));
            let finder = Finder::new(Options::default()).unwrap();
            let _ = finder.solve(&problem);
        });
    });

    group.bench_function("distinct_constants_6_xmass", |b| {
        b.iter(|| {
            let problem = black_box(distinct_constants_problem(6));
            let finder = Finder::new(Options {
                xmass: true,
                ..Options::default()
            })
            .unwrap();
            let _ = finder.solve(&problem);
        });
    });

    group.bench_function("fixpoint_free", |b| {
        b.iter(|| {
            let problem = black_box(fixpoint_free_problem());
            let finder = Finder::new(Options::default()).unwrap();
            let _ = finder.solve(&problem);
        });
    });

    group.finish();
}

criterion_group!(benches, finder_benchmarks);
criterion_main!(benches);
