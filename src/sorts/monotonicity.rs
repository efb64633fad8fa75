//! Monotonicity analysis and the guard-predicate rewrite
//!
//! A sort is monotonic when every model of the clause set can be extended
//! with a fresh domain element of that sort. The check is itself a SAT
//! problem: every predicate gets two variables, "extend true" and "extend
//! false", and each occurrence of a variable of the candidate sort
//! contributes a clause demanding a guard that keeps its clause satisfied on
//! the new element. Non-monotonic sorts can be collapsed by guarding their
//! variables with a fresh sort predicate.

use crate::engine::{SatSolver, SolveResult};
use crate::fol::{Clause, Literal, PredId, Signature, SortId, Var};

/// Computes the declared sort of each variable of a flattened clause
///
/// Returns `None` for variables that do not occur in the clause.
pub fn declared_variable_sorts(signature: &Signature, clause: &Clause) -> Vec<Option<SortId>> {
    let mut sorts = vec![None; clause.var_count() as usize];
    for literal in clause.literals() {
        match literal {
            Literal::FunEq {
                function,
                args,
                result,
                ..
            } => {
                let symbol = signature.function(*function);
                for (i, &arg) in args.iter().enumerate() {
                    sorts[arg as usize] = Some(symbol.arg_sorts()[i]);
                }
                sorts[*result as usize] = Some(symbol.result_sort());
            }
            Literal::VarEq {
                left, right, sort, ..
            } => {
                sorts[*left as usize] = Some(*sort);
                sorts[*right as usize] = Some(*sort);
            }
            Literal::Pred {
                predicate, args, ..
            } => {
                let symbol = signature.predicate(*predicate);
                for (i, &arg) in args.iter().enumerate() {
                    sorts[arg as usize] = Some(symbol.arg_sorts()[i]);
                }
            }
        }
    }
    sorts
}

/// Monotonicity check for a single declared sort
pub struct Monotonicity<S> {
    solver: S,
    sort: SortId,
    /// "extendable by a true row" variable per predicate
    p_true: Vec<u32>,
    /// "extendable by a false row" variable per predicate
    p_false: Vec<u32>,
}

impl<S: SatSolver> Monotonicity<S> {
    /// Decides whether `sort` is monotonic over the given clause set
    ///
    /// Sorts without variable occurrences are trivially monotonic.
    pub fn check(signature: &Signature, clauses: &[Clause], sort: SortId, solver: S) -> bool {
        let mut analysis = Self::new(signature, sort, solver);
        for clause in clauses {
            let var_sorts = declared_variable_sorts(signature, clause);
            for literal in clause.literals() {
                analysis.monotone(clause, &var_sorts, literal);
            }
        }
        analysis.solver.solve() == SolveResult::Sat
    }

    fn new(signature: &Signature, sort: SortId, mut solver: S) -> Self {
        let npreds = signature.predicate_count() as usize;
        let mut p_true = vec![0; npreds];
        let mut p_false = vec![0; npreds];
        for p in signature.predicate_ids() {
            p_true[p as usize] = solver.new_var();
            p_false[p as usize] = solver.new_var();
            // A predicate cannot be extended both ways at once
            solver.add_clause(&[
                -(p_true[p as usize] as i32),
                -(p_false[p as usize] as i32),
            ]);
        }
        Self {
            solver,
            sort,
            p_true,
            p_false,
        }
    }

    fn monotone(&mut self, clause: &Clause, var_sorts: &[Option<SortId>], literal: &Literal) {
        match literal {
            // A positive equality threatens monotonicity through each
            // variable side; negative equalities are harmless
            Literal::FunEq {
                positive: true,
                result,
                ..
            } => {
                self.safe(clause, var_sorts, *result, None);
            }
            Literal::VarEq {
                positive: true,
                left,
                right,
                ..
            } => {
                self.safe(clause, var_sorts, *left, None);
                self.safe(clause, var_sorts, *right, None);
            }
            Literal::Pred {
                positive,
                predicate,
                args,
            } => {
                let extension = if *positive {
                    -(self.p_false[*predicate as usize] as i32)
                } else {
                    -(self.p_true[*predicate as usize] as i32)
                };
                for &arg in args {
                    self.safe(clause, var_sorts, arg, Some(extension));
                }
            }
            _ => {}
        }
    }

    /// Emits the safety clause for one occurrence of `var`, unless some
    /// negative equality on `var` already keeps the clause satisfied on a
    /// fresh element
    fn safe(&mut self, clause: &Clause, var_sorts: &[Option<SortId>], var: Var, seed: Option<i32>) {
        if var_sorts[var as usize] != Some(self.sort) {
            return;
        }
        let mut lits: Vec<i32> = seed.into_iter().collect();
        for literal in clause.literals() {
            if self.guards(literal, var, &mut lits) {
                return;
            }
        }
        self.solver.add_clause(&lits);
    }

    /// Collects guard literals from `literal` for occurrences of `var`
    ///
    /// Returns true when the literal is a negative equality with `var` on
    /// one side, which satisfies the clause outright on a fresh element.
    fn guards(&self, literal: &Literal, var: Var, lits: &mut Vec<i32>) -> bool {
        match literal {
            Literal::FunEq {
                positive: false,
                result,
                ..
            } => *result == var,
            Literal::VarEq {
                positive: false,
                left,
                right,
                ..
            } => *left == var || *right == var,
            Literal::Pred {
                positive,
                predicate,
                args,
            } => {
                if args.contains(&var) {
                    let guard = if *positive {
                        self.p_true[*predicate as usize]
                    } else {
                        self.p_false[*predicate as usize]
                    };
                    lits.push(guard as i32);
                }
                false
            }
            _ => false,
        }
    }
}

/// Guard predicates introduced for non-monotonic sorts, per declared sort
pub type SortPredicates = Vec<Option<PredId>>;

/// Collapses non-monotonic sorts by guarding their variables
///
/// For every non-monotonic sort a fresh unary predicate is introduced, with
/// axioms making it hold on every function image and on a fresh witness
/// constant, and every clause quantifying over the sort is weakened by
/// `~sortPredicate(X)` guards. `deleted` marks functions that must not
/// receive image axioms.
pub fn add_sort_predicates(
    signature: &mut Signature,
    clauses: &mut Vec<Clause>,
    monotonic: &[bool],
    deleted: &[bool],
) -> SortPredicates {
    let mut sort_predicates: SortPredicates = vec![None; signature.sort_count() as usize];
    let mut axioms: Vec<Clause> = Vec::new();

    for sort in 0..signature.sort_count() {
        if monotonic[sort as usize] {
            continue;
        }
        let name = format!("sortPredicate_{}", signature.sort_name(sort));
        let guard = signature.add_predicate(&name, &[sort]);
        sort_predicates[sort as usize] = Some(guard);

        // Every function image lies in the sort: { f(X..) != Y | guard(Y) }
        for f in 0..signature.function_count() {
            if deleted.get(f as usize).copied().unwrap_or(false) {
                continue;
            }
            if signature.function(f).result_sort() != sort {
                continue;
            }
            let arity = signature.function(f).arity() as u32;
            let args: Vec<Var> = (0..arity).collect();
            axioms.push(Clause::new(
                arity + 1,
                vec![
                    Literal::fun_eq(false, f, args, arity),
                    Literal::pred(true, guard, vec![arity]),
                ],
            ));
        }

        // The sort is non-empty: { sk != X | guard(X) }
        let witness_name = format!("sk_{}", signature.sort_name(sort));
        let witness = signature.add_function(&witness_name, &[], sort);
        axioms.push(Clause::new(
            1,
            vec![
                Literal::fun_eq(false, witness, vec![], 0),
                Literal::pred(true, guard, vec![0]),
            ],
        ));
    }

    // Weaken every original clause that quantifies over a guarded sort; the
    // axioms themselves stay unguarded
    for clause in clauses.iter_mut() {
        let var_sorts = declared_variable_sorts(signature, clause);
        let guarded: Vec<Var> = (0..clause.var_count())
            .filter(|&v| {
                var_sorts[v as usize]
                    .and_then(|s| sort_predicates[s as usize])
                    .is_some()
            })
            .collect();
        if guarded.is_empty() {
            continue;
        }
        let mut literals = clause.literals().to_vec();
        for v in guarded {
            let sort = var_sorts[v as usize].expect("guarded variables have sorts");
            let guard = sort_predicates[sort as usize].expect("guarded sorts have predicates");
            literals.push(Literal::pred(false, guard, vec![v]));
        }
        *clause = Clause::new(clause.var_count(), literals);
    }
    clauses.append(&mut axioms);

    sort_predicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::Signature;
    use rustsat_batsat::BasicSolver;

    fn batsat() -> crate::engine::RustSatAdapter<BasicSolver> {
        crate::engine::RustSatAdapter::new(BasicSolver::default())
    }

    #[test]
    fn unused_sort_is_monotonic() {
        let mut sig = Signature::new();
        let s = sig.add_sort("S");
        let t = sig.add_sort("T");
        let p = sig.add_predicate("p", &[s]);
        let clauses = vec![Clause::new(1, vec![Literal::pred(true, p, vec![0])])];
        assert!(Monotonicity::check(&sig, &clauses, t, batsat()));
    }

    #[test]
    fn plain_predicate_sort_is_monotonic() {
        // { p(X) } alone: extend p with false rows and any new element is fine
        let mut sig = Signature::new();
        let s = sig.add_sort("S");
        let p = sig.add_predicate("p", &[s]);
        let clauses = vec![Clause::new(1, vec![Literal::pred(true, p, vec![0])])];
        assert!(Monotonicity::check(&sig, &clauses, s, batsat()));
    }

    #[test]
    fn positive_equality_breaks_monotonicity() {
        // { p(X) | X = a }: a fresh element must satisfy p, but { ~p(X) | X = a }
        // forces p false away from a, so no extension policy works
        let mut sig = Signature::new();
        let s = sig.add_sort("S");
        let a = sig.add_function("a", &[], s);
        let p = sig.add_predicate("p", &[s]);
        let clauses = vec![
            Clause::new(
                1,
                vec![
                    Literal::pred(true, p, vec![0]),
                    Literal::fun_eq(true, a, vec![], 0),
                ],
            ),
            Clause::new(
                1,
                vec![
                    Literal::pred(false, p, vec![0]),
                    Literal::fun_eq(true, a, vec![], 0),
                ],
            ),
        ];
        assert!(!Monotonicity::check(&sig, &clauses, s, batsat()));
    }

    #[test]
    fn negative_equality_shields_the_clause() {
        // { p(X) | X != a }: the fresh element falsifies X = a, so the
        // clause needs no guard at all
        let mut sig = Signature::new();
        let s = sig.add_sort("S");
        let a = sig.add_function("a", &[], s);
        let p = sig.add_predicate("p", &[s]);
        let clauses = vec![Clause::new(
            1,
            vec![
                Literal::pred(true, p, vec![0]),
                Literal::fun_eq(false, a, vec![], 0),
            ],
        )];
        assert!(Monotonicity::check(&sig, &clauses, s, batsat()));
    }

    #[test]
    fn rewrite_guards_clauses_and_adds_axioms() {
        let mut sig = Signature::new();
        let s = sig.add_sort("S");
        let a = sig.add_function("a", &[], s);
        let p = sig.add_predicate("p", &[s]);
        let mut clauses = vec![Clause::new(
            1,
            vec![
                Literal::pred(true, p, vec![0]),
                Literal::fun_eq(true, a, vec![], 0),
            ],
        )];
        let monotonic = vec![false];
        let preds = add_sort_predicates(&mut sig, &mut clauses, &monotonic, &[false]);
        let guard = preds[s as usize].unwrap();

        // Image axiom for a, witness axiom for the skolem constant, and the
        // original clause guarded in place
        assert_eq!(clauses.len(), 3);
        assert_eq!(sig.function_count(), 2);
        let rewritten = &clauses[0];
        assert!(rewritten.literals().iter().any(
            |l| matches!(l, Literal::Pred { positive: false, predicate, .. } if *predicate == guard)
        ));
        // The axioms themselves carry no guard literals
        assert!(clauses[1..].iter().all(|c| !c.literals().iter().any(
            |l| matches!(l, Literal::Pred { positive: false, predicate, .. } if *predicate == guard)
        )));
    }
}
